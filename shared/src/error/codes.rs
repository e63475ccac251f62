//! Error codes for the booking service
//!
//! Codes are grouped by range:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Reservation errors
//! - 5xxx: Waitlist errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so the website can branch on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request (malformed body, bad JSON)
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests from one client
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (username/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 4xxx: Reservation ====================
    /// Reservation not found (or phone does not own it)
    ReservationNotFound = 4001,
    /// Slot has no remaining tables
    SlotFull = 4002,
    /// Too close to the reservation date to cancel online
    CancellationWindowClosed = 4003,
    /// Reservation is already cancelled
    ReservationAlreadyCancelled = 4004,
    /// Date or time is not a bookable slot
    SlotNotOffered = 4005,
    /// Party size below the minimum
    PartyTooSmall = 4006,

    // ==================== 5xxx: Waitlist ====================
    /// Waitlist entry not found
    WaitlistEntryNotFound = 5001,
    /// Phone already holds an active entry for this slot
    AlreadyOnWaitlist = 5002,
    /// Requested waitlist status change is not allowed
    WaitlistInvalidTransition = 5003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid username or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::SlotFull => "This time slot is fully booked",
            ErrorCode::CancellationWindowClosed => {
                "Reservations can no longer be cancelled online this close to the date"
            }
            ErrorCode::ReservationAlreadyCancelled => "Reservation is already cancelled",
            ErrorCode::SlotNotOffered => "Requested date or time is not available for booking",
            ErrorCode::PartyTooSmall => "Party size is below the minimum",

            // Waitlist
            ErrorCode::WaitlistEntryNotFound => "Waitlist entry not found",
            ErrorCode::AlreadyOnWaitlist => "Already registered on the waitlist for this slot",
            ErrorCode::WaitlistInvalidTransition => "Waitlist status change is not allowed",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown `u16` into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Reservation
            4001 => Ok(ErrorCode::ReservationNotFound),
            4002 => Ok(ErrorCode::SlotFull),
            4003 => Ok(ErrorCode::CancellationWindowClosed),
            4004 => Ok(ErrorCode::ReservationAlreadyCancelled),
            4005 => Ok(ErrorCode::SlotNotOffered),
            4006 => Ok(ErrorCode::PartyTooSmall),

            // Waitlist
            5001 => Ok(ErrorCode::WaitlistEntryNotFound),
            5002 => Ok(ErrorCode::AlreadyOnWaitlist),
            5003 => Ok(ErrorCode::WaitlistInvalidTransition),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
