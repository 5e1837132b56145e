mod context;
mod services;
mod stages;
mod state;

pub use context::{JobParams, VideoBundle};
#[allow(clippy::module_name_repetitions)]
pub use services::{DefaultJobServices, JobServices};

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::course_job::CourseJob},
    utils::{config::AppConfig, embedding::EmbeddingProvider, youtube::YoutubeClient},
};
use tracing::{debug, info};

use self::{
    context::JobContext,
    stages::{generate, load_video, persist, retrieve, store_chunks},
    state::ready,
};
use crate::generation::ContentGenerator;

pub struct CoursePipeline {
    db: Arc<SurrealDbClient>,
    services: Arc<dyn JobServices>,
}

impl CoursePipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        youtube: YoutubeClient,
        embedding_provider: Arc<EmbeddingProvider>,
        generator: ContentGenerator,
        config: &AppConfig,
    ) -> Self {
        let services = DefaultJobServices::new(
            Arc::clone(&db),
            youtube,
            embedding_provider,
            generator,
            config,
        );
        Self::with_services(db, Arc::new(services))
    }

    pub fn with_services(db: Arc<SurrealDbClient>, services: Arc<dyn JobServices>) -> Self {
        Self { db, services }
    }

    /// Process an already-claimed job through the full stage sequence and
    /// record the terminal status on the job row.
    #[tracing::instrument(
        skip_all,
        fields(
            job_id = %job.id,
            course_id = %job.course_id,
            video_id = %job.video_id,
            worker_id = job.worker_id.as_deref().unwrap_or("unknown-worker")
        )
    )]
    pub async fn process_job(&self, job: CourseJob) -> Result<(), AppError> {
        let params = JobParams {
            difficulty: job.difficulty,
            question_count: job.question_count,
            summary_detail: job.summary_detail,
        };

        match self
            .drive_pipeline(
                job.id.clone(),
                job.course_id.clone(),
                job.video_id.clone(),
                params,
            )
            .await
        {
            Ok(()) => {
                job.mark_completed(&self.db).await?;
                info!(job_id = %job.id, "course job completed");
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                job.mark_failed(&reason, &self.db).await?;
                Err(AppError::Processing(reason))
            }
        }
    }

    /// Run the stage sequence for one video outside the job queue. Used by
    /// the synchronous course-creation path.
    pub async fn ingest_video(
        &self,
        course_id: &str,
        video_id: &str,
        params: JobParams,
    ) -> Result<(), AppError> {
        self.drive_pipeline(
            format!("sync-{video_id}"),
            course_id.to_string(),
            video_id.to_string(),
            params,
        )
        .await
    }

    async fn drive_pipeline(
        &self,
        job_id: String,
        course_id: String,
        video_id: String,
        params: JobParams,
    ) -> Result<(), AppError> {
        let mut ctx = JobContext::new(
            job_id,
            course_id,
            video_id,
            params,
            self.db.as_ref(),
            self.services.as_ref(),
        );

        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = load_video(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let load_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = store_chunks(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let chunk_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = retrieve(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let retrieve_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = generate(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let generate_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let _machine = persist(machine, &mut ctx)
            .await
            .map_err(|err| ctx.abort(err))?;
        let persist_duration = stage_start.elapsed();

        debug!(
            job_id = %ctx.job_id,
            total_ms = duration_millis(pipeline_started.elapsed()),
            load_ms = duration_millis(load_duration),
            chunk_ms = duration_millis(chunk_duration),
            retrieve_ms = duration_millis(retrieve_duration),
            generate_ms = duration_millis(generate_duration),
            persist_ms = duration_millis(persist_duration),
            "course pipeline finished"
        );

        Ok(())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
