//! Waitlist API Handlers

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::error::ApiResponse;
use shared::models::{WaitlistEntry, WaitlistStatus};

use super::ApiResult;
use super::extract::ApiJson;
use crate::services::{BookingRequest, PhoneQuery, WaitlistView};
use crate::state::AppState;

/// What a customer gets back after joining the queue
#[derive(Debug, Serialize)]
pub struct WaitlistReceipt {
    pub id: i64,
    pub position: i32,
    pub status: WaitlistStatus,
    pub phone: String,
}

impl From<WaitlistEntry> for WaitlistReceipt {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            id: entry.id,
            position: entry.position,
            status: entry.status,
            phone: entry.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WaitlistBody<T> {
    pub waitlist: T,
}

/// POST /api/add-waitlist
pub async fn add_waitlist(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> ApiResult<WaitlistBody<WaitlistReceipt>> {
    let entry = state.booking.add_waitlist(req).await?;
    Ok(Json(ApiResponse::success(WaitlistBody {
        waitlist: entry.into(),
    })))
}

/// POST /api/get-waitlist
pub async fn get_waitlist(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PhoneQuery>,
) -> ApiResult<WaitlistBody<Vec<WaitlistView>>> {
    let waitlist = state.booking.my_waitlist(req).await?;
    Ok(Json(ApiResponse::success(WaitlistBody { waitlist })))
}
