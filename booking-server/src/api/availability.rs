//! Availability API Handler

use axum::Json;
use axum::extract::State;
use shared::booking::SlotAvailability;
use shared::error::ApiResponse;

use super::ApiResult;
use super::extract::ApiJson;
use crate::services::SlotQuery;
use crate::state::AppState;

/// POST /api/check-availability
pub async fn check_availability(
    State(state): State<AppState>,
    ApiJson(query): ApiJson<SlotQuery>,
) -> ApiResult<SlotAvailability> {
    let availability = state.booking.check_availability(&query).await?;
    Ok(Json(ApiResponse::success(availability)))
}
