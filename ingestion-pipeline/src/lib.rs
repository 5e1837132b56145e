#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod chunk_store;
pub mod generation;
pub mod ingest;
pub mod llm_instructions;
pub mod pipeline;

use common::storage::{db::SurrealDbClient, types::course_job::CourseJob};
pub use pipeline::{CoursePipeline, DefaultJobServices, JobParams, JobServices};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

pub async fn run_worker_loop(
    db: Arc<SurrealDbClient>,
    course_pipeline: Arc<CoursePipeline>,
) -> Result<(), Box<dyn std::error::Error>> {
    let worker_id = format!("course-worker-{}", Uuid::new_v4());
    let idle_backoff = Duration::from_millis(500);

    loop {
        match CourseJob::claim_next_ready(&db, &worker_id).await {
            Ok(Some(job)) => {
                let job_id = job.id.clone();
                info!(
                    %worker_id,
                    %job_id,
                    course_id = %job.course_id,
                    video_id = %job.video_id,
                    "claimed course job"
                );
                if let Err(err) = course_pipeline.process_job(job).await {
                    error!(%worker_id, %job_id, error = %err, "course job failed");
                }
            }
            Ok(None) => {
                sleep(idle_backoff).await;
            }
            Err(err) => {
                error!(%worker_id, error = %err, "failed to claim course job");
                warn!("Backing off for 1s after claim error");
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
