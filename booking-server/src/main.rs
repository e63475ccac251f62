//! booking-server: reservations and waitlist for a single-venue event
//!
//! Long-running service that:
//! - Books tables per `(date, time)` slot under a fixed capacity
//! - Keeps an ordered waitlist and notifies the head when a table frees up
//! - Expires notifications that were not converted in time
//! - Serves the admin dashboard (JWT authenticated)

use std::net::SocketAddr;
use std::time::Duration;

use booking_server::logger::init_logger;
use booking_server::{AppState, BoxError, Config, create_router};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger(&config.log_format);
    tracing::info!("Starting booking-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;
    let app = create_router(state.clone(), &config.cors_allowed_origins);

    // Periodic notification expiry sweep
    let booking = state.booking.clone();
    let sweep_every = Duration::from_secs(config.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            match booking.sweep_expired().await {
                Ok(0) => {}
                Ok(expired) => tracing::info!(expired, "Expired waitlist notifications cancelled"),
                Err(e) => tracing::error!("Waitlist sweep failed: {e}"),
            }
        }
    });

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("booking-server HTTP listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("booking-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
