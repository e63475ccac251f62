//! Dashboard waitlist handlers

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::error::ApiResponse;
use shared::models::WaitlistEntry;

use crate::api::ApiResult;
use crate::api::extract::{ApiJson, JsonOrDefault};
use crate::api::waitlist::WaitlistBody;
use crate::auth::AdminUser;
use crate::services::{IdRequest, ListQuery, SlotQuery, WaitlistUpdateRequest};
use crate::state::AppState;

/// Contact details of the entry that was just notified
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedContact {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub expires_at: Option<i64>,
}

impl From<WaitlistEntry> for NotifiedContact {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            phone: entry.phone,
            email: entry.email,
            expires_at: entry.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// 1 when someone was notified, 0 otherwise
    pub notified: u8,
    /// Lapsed notifications cancelled on the way
    pub expired: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist: Option<NotifiedContact>,
}

/// POST /api/process-waitlist
pub async fn process(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(query): ApiJson<SlotQuery>,
) -> ApiResult<ProcessResponse> {
    tracing::debug!(admin = %admin.username, "Processing waitlist");
    let promotion = state.booking.process_waitlist(query).await?;
    Ok(Json(ApiResponse::success(ProcessResponse {
        notified: u8::from(promotion.promoted.is_some()),
        expired: promotion.expired,
        waitlist: promotion.promoted.map(NotifiedContact::from),
    })))
}

/// POST /api/admin/waitlist
pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    JsonOrDefault(query): JsonOrDefault<ListQuery>,
) -> ApiResult<WaitlistBody<Vec<WaitlistEntry>>> {
    let waitlist = state.booking.list_waitlist(query).await?;
    Ok(Json(ApiResponse::success(WaitlistBody { waitlist })))
}

/// POST /api/update-waitlist
pub async fn update(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WaitlistUpdateRequest>,
) -> ApiResult<WaitlistBody<WaitlistEntry>> {
    tracing::debug!(admin = %admin.username, id = ?req.id, "Updating waitlist entry");
    let waitlist = state.booking.update_waitlist(req).await?;
    Ok(Json(ApiResponse::success(WaitlistBody { waitlist })))
}

/// POST /api/delete-waitlist
pub async fn delete(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IdRequest>,
) -> ApiResult<()> {
    tracing::debug!(admin = %admin.username, id = ?req.id, "Deleting waitlist entry");
    state.booking.delete_waitlist(req).await?;
    Ok(Json(ApiResponse::ok()))
}
