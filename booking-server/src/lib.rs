//! booking-server: reservation and waitlist service for a restaurant event
//!
//! - Per-slot table capacity with atomic booking
//! - FIFO waitlist with time-boxed promotion on cancellation
//! - Self-service cancellation and lookup by phone
//! - Admin dashboard API (JWT authenticated)

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod services;
pub mod state;
pub mod util;
pub mod validation;

pub use api::create_router;
pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
