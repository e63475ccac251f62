//! Admin authentication and request throttling

pub mod admin_auth;
pub mod rate_limit;

pub use admin_auth::{AdminClaims, AdminUser, create_token, verify_token};
pub use rate_limit::RateLimiter;
