//! Dashboard API
//!
//! Every handler takes [`AdminUser`](crate::auth::AdminUser), so a missing or
//! bad bearer token is rejected before the body is read.

pub mod auth;
pub mod reservations;
pub mod stories;
pub mod waitlist;

use axum::Router;
use axum::routing::post;

use crate::state::AppState;

/// Admin routes (login is mounted separately behind its own rate limit)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/reservations", post(reservations::list))
        .route("/api/admin/add-reservation", post(reservations::add))
        .route("/api/admin/update-reservation", post(reservations::update))
        .route("/api/admin/delete-reservation", post(reservations::delete))
        .route("/api/admin/waitlist", post(waitlist::list))
        .route("/api/process-waitlist", post(waitlist::process))
        .route("/api/update-waitlist", post(waitlist::update))
        .route("/api/delete-waitlist", post(waitlist::delete))
        .route("/api/admin/stories", post(stories::list))
}
