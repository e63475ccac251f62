//! Dashboard story listing

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::error::ApiResponse;
use shared::models::Story;

use crate::api::ApiResult;
use crate::auth::AdminUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StoriesBody {
    pub stories: Vec<Story>,
}

/// POST /api/admin/stories
pub async fn list(_admin: AdminUser, State(state): State<AppState>) -> ApiResult<StoriesBody> {
    let stories = state.booking.list_stories().await?;
    Ok(Json(ApiResponse::success(StoriesBody { stories })))
}
