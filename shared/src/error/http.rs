//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::ReservationNotFound | Self::WaitlistEntryNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyOnWaitlist
            | Self::ReservationAlreadyCancelled
            | Self::WaitlistInvalidTransition => StatusCode::CONFLICT,

            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,

            // Capacity and cancellation-window refusals stay 400 for the website
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(
            ErrorCode::ReservationNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::WaitlistEntryNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_business_refusals_are_bad_request() {
        assert_eq!(ErrorCode::SlotFull.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::CancellationWindowClosed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::PartyTooSmall.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::AlreadyOnWaitlist.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_auth_and_system_status() {
        assert_eq!(
            ErrorCode::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::TooManyRequests.http_status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
