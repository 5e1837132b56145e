use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::{api_state::ApiState, error::ApiError};

/// Proxy snippet-level metadata for a single YouTube video.
pub async fn video_data(
    State(state): State<ApiState>,
    Path(video_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if video_id.trim().is_empty() {
        return Err(ApiError::ValidationError("videoId is required".to_string()));
    }

    let metadata = state.youtube.fetch_video(&video_id).await?;

    Ok(Json(metadata))
}
