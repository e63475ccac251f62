//! Reservation API Handlers

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::error::ApiResponse;
use shared::models::Reservation;

use super::ApiResult;
use super::extract::ApiJson;
use crate::services::{BookingRequest, CancelRequest, PhoneQuery, ReservationView};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReservationBody {
    pub reservation: Reservation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub message: String,
    pub reservation: Reservation,
    pub days_until: i64,
    pub waitlist_notified: bool,
}

#[derive(Debug, Serialize)]
pub struct ReservationsBody<T> {
    pub reservations: Vec<T>,
}

/// POST /api/create-reservation
pub async fn create_reservation(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> ApiResult<ReservationBody> {
    let reservation = state.booking.create_reservation(req).await?;
    Ok(Json(ApiResponse::success(ReservationBody { reservation })))
}

/// POST /api/cancel-my-reservation
pub async fn cancel_my_reservation(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CancelRequest>,
) -> ApiResult<CancelBody> {
    let cancellation = state.booking.cancel_my_reservation(req).await?;
    Ok(Json(ApiResponse::success(CancelBody {
        message: "Reservation cancelled".to_string(),
        reservation: cancellation.reservation,
        days_until: cancellation.days_until,
        waitlist_notified: cancellation.promoted.is_some(),
    })))
}

/// POST /api/get-my-reservation
pub async fn get_my_reservation(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PhoneQuery>,
) -> ApiResult<ReservationsBody<ReservationView>> {
    let reservations = state.booking.my_reservations(req).await?;
    Ok(Json(ApiResponse::success(ReservationsBody { reservations })))
}
