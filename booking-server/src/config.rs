//! Booking server configuration

use chrono::{Duration, FixedOffset};
use shared::booking::BookingPolicy;
use shared::booking::policy::{
    DEFAULT_CANCELLATION_MIN_DAYS, DEFAULT_MAX_TABLES, DEFAULT_NOTIFY_WINDOW_HOURS,
};

use crate::BoxError;

/// Booking server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// PostgreSQL connection URL (development falls back to the in-memory store)
    pub database_url: Option<String>,
    /// HTTP port
    pub http_port: u16,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Admin token lifetime in hours
    pub admin_token_hours: i64,
    /// Bootstrap admin account, created or re-hashed on startup
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Capacity, windows and the bookable calendar
    pub policy: BookingPolicy,
    /// Background expiry sweep period
    pub sweep_interval_secs: u64,
    /// Comma-separated origins, `*` for any
    pub cors_allowed_origins: String,
    /// `pretty` or `json`
    pub log_format: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Parse a numeric env var, keeping the default when unset.
    fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| format!("{name} has an invalid value: {raw}").into()),
            _ => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let database_url = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && environment != "development" {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        Ok(Self {
            database_url,
            http_port: Self::parse_var("HTTP_PORT", 8080)?,
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            admin_token_hours: Self::parse_var("ADMIN_TOKEN_HOURS", 12)?,
            admin_username: std::env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            policy: Self::policy_from_env()?,
            sweep_interval_secs: Self::parse_var("SWEEP_INTERVAL_SECS", 300)?,
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".into()),
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()),
            environment,
        })
    }

    fn policy_from_env() -> Result<BookingPolicy, BoxError> {
        let defaults = BookingPolicy::default();

        let utc_offset = utc_offset(Self::parse_var("UTC_OFFSET_MINUTES", 0)?)?;

        let event_dates = match std::env::var("EVENT_DATES") {
            Ok(raw) => BookingPolicy::parse_dates(&raw)?,
            Err(_) => defaults.event_dates,
        };
        let slot_times = match std::env::var("SLOT_TIMES") {
            Ok(raw) if !raw.trim().is_empty() => BookingPolicy::parse_times(&raw)?,
            _ => defaults.slot_times,
        };

        let max_tables: u32 = Self::parse_var("MAX_TABLES", DEFAULT_MAX_TABLES)?;
        if max_tables == 0 {
            return Err("MAX_TABLES must be at least 1".into());
        }

        Ok(BookingPolicy {
            max_tables,
            notify_window: Duration::hours(Self::parse_var(
                "NOTIFY_WINDOW_HOURS",
                DEFAULT_NOTIFY_WINDOW_HOURS,
            )?),
            cancellation_min_days: Self::parse_var(
                "CANCELLATION_MIN_DAYS",
                DEFAULT_CANCELLATION_MIN_DAYS,
            )?,
            min_guests: defaults.min_guests,
            event_dates,
            slot_times,
            utc_offset,
        })
    }
}

/// `UTC_OFFSET_MINUTES` as a fixed offset; must stay within +/-24h.
fn utc_offset(minutes: i32) -> Result<FixedOffset, BoxError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| format!("UTC_OFFSET_MINUTES out of range: {minutes}").into())
}
