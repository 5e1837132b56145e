use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError, extract::ApiJson};

#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub channel: String,
}

#[derive(Debug, Deserialize)]
pub struct TitleDescriptionRequest {
    #[serde(alias = "videoInfo")]
    pub video_info: Vec<VideoInfo>,
}

/// Suggest a course title and description from the videos it will contain.
pub async fn generate_title_description(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<TitleDescriptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.video_info.is_empty() {
        return Err(ApiError::ValidationError(
            "videoInfo must not be empty".to_string(),
        ));
    }

    let video_info: Vec<(String, String)> = request
        .video_info
        .into_iter()
        .map(|info| (info.title, info.channel))
        .collect();

    let suggestion = state.generator.generate_title_description(&video_info).await?;

    Ok(Json(json!({
        "title": suggestion.title,
        "description": suggestion.description,
    })))
}
