use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, Voice};
use axum::{extract::State, response::IntoResponse, Json};
use common::error::AppError;
use futures::future::try_join_all;
use ingestion_pipeline::generation::split_by_sentences;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{api_state::ApiState, error::ApiError, extract::ApiJson};

/// Upstream per-request input ceiling is 4096 characters; stay comfortably
/// under it so sentence packing never overruns.
const MAX_TTS_CHARS: usize = 2800;

#[derive(Debug, Deserialize)]
pub struct TextToSpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

/// Split the text on sentence boundaries and synthesize each part.
pub async fn text_to_speech(
    State(state): State<ApiState>,
    ApiJson(request): ApiJson<TextToSpeechRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::ValidationError("text is required".to_string()));
    }

    let voice = parse_voice(
        request
            .voice
            .as_deref()
            .unwrap_or(&state.config.tts_voice),
    );
    let parts = split_by_sentences(&request.text, MAX_TTS_CHARS);
    debug!(parts = parts.len(), "synthesizing speech");

    let audio_parts: Vec<Vec<u8>> = try_join_all(parts.into_iter().map(|part| {
        let voice = voice.clone();
        let model = state.config.tts_model.clone();
        let client = state.openai_client.clone();
        async move {
            let speech_request = CreateSpeechRequestArgs::default()
                .model(SpeechModel::Other(model))
                .voice(voice)
                .input(part)
                .build()?;
            let response = client.audio().speech(speech_request).await?;
            Ok::<Vec<u8>, AppError>(response.bytes.to_vec())
        }
    }))
    .await?;

    Ok(Json(json!({ "audioParts": audio_parts })))
}

fn parse_voice(name: &str) -> Voice {
    match name.to_lowercase().as_str() {
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        _ => Voice::Alloy,
    }
}
