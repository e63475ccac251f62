//! Application state

use std::sync::Arc;

use shared::booking::BookingPolicy;

use crate::BoxError;
use crate::auth::RateLimiter;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::{BookingStore, MemoryStore, PgStore};
use crate::services::BookingService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Booking rules over the configured store
    pub booking: BookingService,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Admin token lifetime
    pub admin_token_hours: i64,
    /// Rate limiter for login and public write routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create a new AppState: PostgreSQL when configured, memory otherwise.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn BookingStore> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url).await?;
                tracing::info!("PostgreSQL store ready, migrations applied");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
                Arc::new(MemoryStore::new())
            }
        };

        let state = Self::with_parts(
            store,
            config.policy.clone(),
            Arc::new(SystemClock),
            config.jwt_secret.clone(),
            config.admin_token_hours,
        );

        if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
            state
                .booking
                .bootstrap_admin(username, password)
                .await
                .map_err(|e| format!("admin bootstrap failed: {e}"))?;
        }

        Ok(state)
    }

    /// Assemble from explicit parts (tests, embedding).
    pub fn with_parts(
        store: Arc<dyn BookingStore>,
        policy: BookingPolicy,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
        admin_token_hours: i64,
    ) -> Self {
        Self {
            booking: BookingService::new(store, Arc::new(policy), clock),
            jwt_secret,
            admin_token_hours,
            rate_limiter: RateLimiter::new(),
        }
    }
}
