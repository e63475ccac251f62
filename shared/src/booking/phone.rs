//! Phone number canonicalization
//!
//! Every ingress point stores and compares phones in one digits-only form.

use thiserror::Error;

/// Minimum digits accepted for a phone number
pub const MIN_PHONE_DIGITS: usize = 7;
/// Maximum digits accepted (E.164)
pub const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("phone number is required")]
    Empty,
    #[error("phone number must have between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits")]
    BadLength(usize),
}

/// Strip everything that is not an ASCII digit.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize and check the digit count.
pub fn parse_phone(raw: &str) -> Result<String, PhoneError> {
    let digits = normalize_phone(raw);
    match digits.len() {
        0 => Err(PhoneError::Empty),
        n if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&n) => Err(PhoneError::BadLength(n)),
        _ => Ok(digits),
    }
}
