//! Input validation helpers
//!
//! Centralized text length constants and validation functions shared by the
//! reservation, waitlist and story services.

use shared::booking::{PhoneError, SlotError, parse_phone};
use shared::error::{AppError, ErrorCode};
use validator::ValidateEmail;

// ── Text length limits ──────────────────────────────────────────────

/// Customer and admin names
pub const MAX_NAME_LEN: usize = 100;

/// Special requests
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Customer stories
pub const MAX_STORY_LEN: usize = 2000;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

/// Largest party accepted online
pub const MAX_GUESTS: i32 = 20;

// ── Presence ────────────────────────────────────────────────────────

/// Fail with `RequiredField` listing every field that is absent or blank.
pub fn require_fields(fields: &[(&str, bool)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::required_fields(&missing))
    }
}

/// `true` when an optional text field carries non-blank content.
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ── Text ────────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            trimmed.chars().count()
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate an optional string: blank becomes `None`, otherwise length-checked.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<Option<String>, AppError> {
    let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if v.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(Some(v.to_string()))
}

/// Optional email: blank becomes `None`, otherwise must look like an address.
pub fn validate_email(value: Option<&str>) -> Result<Option<String>, AppError> {
    let email = validate_optional_text(value, "email", MAX_EMAIL_LEN)?;
    match email {
        Some(e) if !e.validate_email() => Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("email '{e}' is not a valid address"),
        )),
        other => Ok(other),
    }
}

// ── Domain fields ───────────────────────────────────────────────────

/// Canonical digits-only phone.
pub fn validate_phone(value: &str) -> Result<String, AppError> {
    parse_phone(value).map_err(|e| match e {
        PhoneError::Empty => AppError::required_fields(&["phone"]),
        other => AppError::with_message(ErrorCode::InvalidFormat, other.to_string()),
    })
}

pub fn validate_guests(guests: i32, min_guests: i32) -> Result<i32, AppError> {
    if guests < min_guests {
        return Err(AppError::with_message(
            ErrorCode::PartyTooSmall,
            format!("guests must be at least {min_guests}"),
        )
        .with_detail("minGuests", min_guests));
    }
    if guests > MAX_GUESTS {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("guests must be between {min_guests} and {MAX_GUESTS}"),
        ));
    }
    Ok(guests)
}

/// Map a slot parse/calendar failure onto the wire error.
pub fn slot_error(err: SlotError) -> AppError {
    match err {
        SlotError::BadDate(_) | SlotError::BadTime(_) => {
            AppError::with_message(ErrorCode::InvalidFormat, err.to_string())
        }
        SlotError::DateNotOffered(_) | SlotError::TimeNotOffered(_) => {
            AppError::with_message(ErrorCode::SlotNotOffered, err.to_string())
        }
    }
}
