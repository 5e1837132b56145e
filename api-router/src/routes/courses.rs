use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use common::storage::types::{
    app_user::AppUser,
    course::Course,
    course_video::CourseVideo,
};
use ingestion_pipeline::{ingest::enqueue_course_videos, JobParams};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{api_state::ApiState, error::ApiError, extract::ApiJson, middleware_jwt_auth::Claims};

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub youtube_ids: Vec<String>,
    pub difficulty: i64,
    #[serde(alias = "questionCount")]
    pub question_count: i64,
    pub summary_detail: i64,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCourseRequest {
    #[serde(alias = "courseId")]
    pub course_id: String,
}

fn validate(request: &CreateCourseRequest) -> Result<JobParams, ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::ValidationError("title is required".to_string()));
    }
    if request.youtube_ids.is_empty() {
        return Err(ApiError::ValidationError(
            "youtube_ids must not be empty".to_string(),
        ));
    }
    Ok(JobParams {
        difficulty: request.difficulty,
        question_count: request.question_count,
        summary_detail: request.summary_detail,
    })
}

/// Create a course and process every video before responding. Failures are
/// collected per video so one broken video does not sink the whole course.
pub async fn create_course(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let params = validate(&request)?;

    let course = Course::new(
        request.title.clone(),
        request.description.clone(),
        Some(claims.sub.clone()),
        request.is_public,
    );
    let course_id = course.id.clone();
    state.db.store_item(course).await?;

    let mut failed = Vec::new();
    for (position, youtube_id) in request.youtube_ids.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| ApiError::ValidationError("too many videos in one course".to_string()))?;
        state
            .db
            .store_item(CourseVideo::new(
                course_id.clone(),
                youtube_id.clone(),
                position,
            ))
            .await?;

        if let Err(err) = state
            .pipeline
            .ingest_video(&course_id, youtube_id, params)
            .await
        {
            error!(course_id, video_id = %youtube_id, error = %err, "video ingestion failed");
            failed.push(json!({ "videoId": youtube_id, "error": err.to_string() }));
        }
    }

    info!(
        course_id,
        videos = request.youtube_ids.len(),
        failed = failed.len(),
        "course created synchronously"
    );

    let status = if failed.is_empty() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(json!({ "courseId": course_id, "failed": failed }))))
}

/// Create a course and enqueue a background job per video. Requires one
/// available credit, which is spent atomically before anything is created.
pub async fn create_course_embed(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let params = validate(&request)?;

    let user = AppUser::try_spend_credit(&state.db, &claims.sub).await?;
    let Some(user) = user else {
        return Err(ApiError::Unauthorized("Insufficient credits".to_string()));
    };

    let course = Course::new(
        request.title.clone(),
        request.description.clone(),
        Some(claims.sub.clone()),
        request.is_public,
    );
    let course_id = course.id.clone();
    state.db.store_item(course).await?;

    let outcome = enqueue_course_videos(&state.db, &course_id, &request.youtube_ids, params).await?;

    info!(
        course_id,
        user_id = %user.id,
        credits_left = user.credits,
        enqueued = outcome.enqueued.len(),
        "course enqueued for background processing"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "courseId": course_id,
            "enqueued": outcome.enqueued,
            "skipped": outcome.skipped,
        })),
    ))
}

/// Cascade-delete a course and everything derived from it.
pub async fn delete_course(
    State(state): State<ApiState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<DeleteCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let course: Option<Course> = state.db.get_item(&request.course_id).await?;
    let course = course
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", request.course_id)))?;

    if let Some(owner_id) = &course.owner_id {
        if owner_id != &claims.sub {
            return Err(ApiError::Unauthorized(
                "You do not own this course".to_string(),
            ));
        }
    }

    Course::delete_cascade(&state.db, &course.id).await?;
    info!(course_id = %course.id, "course deleted");

    Ok(Json(json!({ "status": "ok" })))
}
