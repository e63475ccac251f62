//! HTTP API
//!
//! Every operation is `POST /api/<name>` with a JSON body and a JSON reply:
//! `{"success": true, ...}` or `{"success": false, "error", "code", ...flags}`.

pub mod admin;
pub mod availability;
pub mod extract;
pub mod health;
pub mod reservations;
pub mod stories;
pub mod waitlist;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use http::{HeaderValue, Method, header};
use shared::error::ApiResponse;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{login_rate_limit, public_write_rate_limit};
use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: a success envelope or a mapped error
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

/// Build the full application router
pub fn create_router(state: AppState, cors_origins: &str) -> Router {
    // Customer writes (rate limited)
    let public_writes = Router::new()
        .route("/api/create-reservation", post(reservations::create_reservation))
        .route("/api/cancel-my-reservation", post(reservations::cancel_my_reservation))
        .route("/api/add-waitlist", post(waitlist::add_waitlist))
        .route("/api/submit-story", post(stories::submit_story))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            public_write_rate_limit,
        ));

    // Customer reads
    let public_reads = Router::new()
        .route("/api/check-availability", post(availability::check_availability))
        .route("/api/get-my-reservation", post(reservations::get_my_reservation))
        .route("/api/get-waitlist", post(waitlist::get_waitlist));

    // Admin login (rate limited)
    let login = Router::new()
        .route("/api/admin-login", post(admin::auth::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public_writes)
        .merge(public_reads)
        .merge(login)
        .merge(admin::router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CompressionLayer::new()),
        )
        .layer(build_cors_layer(cors_origins))
}

/// CORS from a comma-separated origin list; `*` allows any origin.
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(3600));

    let origins: Vec<&str> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();

    if origins.is_empty() || origins == ["*"] {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter(|o| **o != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::error!(origin = %o, "Invalid CORS origin ignored");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("All configured CORS origins were invalid; allowing any origin");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?origins, "CORS configured");
        cors.allow_origin(AllowOrigin::list(allowed))
    }
}
