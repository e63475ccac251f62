//! Story API Handler

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use shared::error::ApiResponse;
use shared::models::Story;

use super::ApiResult;
use super::extract::ApiJson;
use crate::services::StoryRequest;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StoryBody {
    pub story: Story,
}

/// POST /api/submit-story
pub async fn submit_story(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StoryRequest>,
) -> ApiResult<StoryBody> {
    let story = state.booking.submit_story(req).await?;
    Ok(Json(ApiResponse::success(StoryBody { story })))
}
