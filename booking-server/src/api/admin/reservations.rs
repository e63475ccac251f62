//! Dashboard reservation handlers

use axum::Json;
use axum::extract::State;
use shared::error::ApiResponse;
use shared::models::Reservation;

use crate::api::ApiResult;
use crate::api::extract::{ApiJson, JsonOrDefault};
use crate::api::reservations::{ReservationBody, ReservationsBody};
use crate::auth::AdminUser;
use crate::services::{AdminBookingRequest, IdRequest, ListQuery, ReservationUpdateRequest};
use crate::state::AppState;

/// POST /api/admin/reservations
pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    JsonOrDefault(query): JsonOrDefault<ListQuery>,
) -> ApiResult<ReservationsBody<Reservation>> {
    let reservations = state.booking.list_reservations(query).await?;
    Ok(Json(ApiResponse::success(ReservationsBody { reservations })))
}

/// POST /api/admin/add-reservation
pub async fn add(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AdminBookingRequest>,
) -> ApiResult<ReservationBody> {
    let reservation = state.booking.admin_add_reservation(req).await?;
    tracing::info!(admin = %admin.username, id = reservation.id, "Reservation added from dashboard");
    Ok(Json(ApiResponse::success(ReservationBody { reservation })))
}

/// POST /api/admin/update-reservation
pub async fn update(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReservationUpdateRequest>,
) -> ApiResult<ReservationBody> {
    tracing::debug!(admin = %admin.username, id = ?req.id, "Updating reservation");
    let reservation = state.booking.admin_update_reservation(req).await?;
    Ok(Json(ApiResponse::success(ReservationBody { reservation })))
}

/// POST /api/admin/delete-reservation
pub async fn delete(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IdRequest>,
) -> ApiResult<ReservationBody> {
    tracing::debug!(admin = %admin.username, id = ?req.id, "Deleting reservation");
    let reservation = state.booking.admin_delete_reservation(req).await?;
    Ok(Json(ApiResponse::success(ReservationBody { reservation })))
}
