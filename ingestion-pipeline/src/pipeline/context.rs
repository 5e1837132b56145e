use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::quiz::QuizQuestion},
    utils::youtube::VideoMetadata,
};
use tracing::error;

use super::services::JobServices;
use crate::chunk_store::PartialBatchResult;

/// Everything fetched for one video before processing starts.
#[derive(Debug, Clone)]
pub struct VideoBundle {
    pub metadata: VideoMetadata,
    pub channel_thumbnail: Option<String>,
    pub transcript: Option<String>,
}

/// Per-video generation parameters carried by a job.
#[derive(Debug, Clone, Copy)]
pub struct JobParams {
    pub difficulty: i64,
    pub question_count: i64,
    pub summary_detail: i64,
}

pub struct JobContext<'a> {
    pub job_id: String,
    pub course_id: String,
    pub video_id: String,
    pub params: JobParams,
    pub db: &'a SurrealDbClient,
    pub services: &'a dyn JobServices,
    pub bundle: Option<VideoBundle>,
    pub batch: Option<PartialBatchResult>,
    pub retrieved_text: Option<String>,
    pub summary: Option<String>,
    pub quiz: Option<Vec<QuizQuestion>>,
}

impl<'a> JobContext<'a> {
    pub fn new(
        job_id: String,
        course_id: String,
        video_id: String,
        params: JobParams,
        db: &'a SurrealDbClient,
        services: &'a dyn JobServices,
    ) -> Self {
        Self {
            job_id,
            course_id,
            video_id,
            params,
            db,
            services,
            bundle: None,
            batch: None,
            retrieved_text: None,
            summary: None,
            quiz: None,
        }
    }

    pub fn transcript(&self) -> Result<&str, AppError> {
        self.bundle
            .as_ref()
            .and_then(|bundle| bundle.transcript.as_deref())
            .ok_or_else(|| {
                AppError::InternalError("transcript expected to be available".into())
            })
    }

    pub fn retrieved_text(&self) -> Result<&str, AppError> {
        self.retrieved_text.as_deref().ok_or_else(|| {
            AppError::InternalError("retrieved text expected to be available".into())
        })
    }

    pub fn take_summary(&mut self) -> Result<String, AppError> {
        self.summary.take().ok_or_else(|| {
            AppError::InternalError("summary expected to be available for persistence".into())
        })
    }

    pub fn take_quiz(&mut self) -> Result<Vec<QuizQuestion>, AppError> {
        self.quiz.take().ok_or_else(|| {
            AppError::InternalError("quiz expected to be available for persistence".into())
        })
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            error = %err,
            "course pipeline aborted"
        );
        err
    }
}
