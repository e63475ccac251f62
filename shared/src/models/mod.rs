//! Data models
//!
//! Shared between the booking server and the website (via API).
//! All IDs are snowflake `i64`; all timestamps are Unix milliseconds.

pub mod admin;
pub mod reservation;
pub mod story;
pub mod waitlist;

pub use admin::*;
pub use reservation::*;
pub use story::*;
pub use waitlist::*;

/// A status string that does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}
