use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use common::storage::types::{
    course_job::{CourseJob, JobStatus},
    course_video::CourseVideo,
    summary::Summary,
};
use serde::Deserialize;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CourseStatusQuery {
    #[serde(alias = "courseId")]
    pub course_id: String,
}

/// Aggregate processing status for a course.
///
/// Precedence: the most recent job's status wins while it is not completed.
/// Once the latest job is done (or no jobs exist), the course is completed
/// when every linked video has a summary, otherwise still processing. A
/// course with no linked videos at all reports failed.
pub async fn course_status(
    State(state): State<ApiState>,
    Query(query): Query<CourseStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.course_id.trim().is_empty() {
        return Err(ApiError::ValidationError(
            "courseId is required".to_string(),
        ));
    }

    let video_ids = CourseVideo::video_ids_for_course(&state.db, &query.course_id).await?;
    if video_ids.is_empty() {
        return Ok(Json(json!({ "status": JobStatus::Failed.as_str() })));
    }

    if let Some(job) = CourseJob::latest_for_course(&state.db, &query.course_id).await? {
        if job.status != JobStatus::Completed {
            return Ok(Json(json!({ "status": job.status.as_str() })));
        }
    }

    let summarized = Summary::count_summarized_videos(&state.db, &video_ids).await?;
    let status = if summarized >= video_ids.len() {
        JobStatus::Completed
    } else {
        JobStatus::Processing
    };

    Ok(Json(json!({ "status": status.as_str() })))
}
