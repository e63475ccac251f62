//! Admin login

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::error::{ApiResponse, AppError};

use crate::api::ApiResult;
use crate::api::extract::ApiJson;
use crate::auth::create_token;
use crate::services::LoginRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Unix milliseconds
    pub expires_at: i64,
    pub username: String,
}

/// POST /api/admin-login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let admin = state.booking.authenticate_admin(&req).await?;
    let (token, expires_at) = create_token(
        admin.id,
        &admin.username,
        &state.jwt_secret,
        state.admin_token_hours,
    )
    .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;

    tracing::info!(username = %admin.username, "Admin logged in");
    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        expires_at,
        username: admin.username,
    })))
}
