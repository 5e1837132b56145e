use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            course_job::{CourseJob, JobStatus},
            course_video::CourseVideo,
        },
    },
};
use tracing::{debug, info};

use crate::pipeline::JobParams;

/// Outcome of enqueueing a batch of videos for background processing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EnqueueOutcome {
    pub enqueued: Vec<String>,
    pub skipped: Vec<String>,
}

/// Link each video to the course and enqueue a processing job per video.
///
/// Links are written up front so course progress can be reported while jobs
/// are still in flight. Videos with an active job already queued for the same
/// course are skipped rather than queued twice; a video whose last job failed
/// is requeued on the same row, so re-invoking the enqueue is how failed
/// videos get re-processed.
pub async fn enqueue_course_videos(
    db: &SurrealDbClient,
    course_id: &str,
    youtube_ids: &[String],
    params: JobParams,
) -> Result<EnqueueOutcome, AppError> {
    let mut outcome = EnqueueOutcome::default();
    let already_linked = CourseVideo::video_ids_for_course(db, course_id).await?;

    for (position, youtube_id) in youtube_ids.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| AppError::Validation("too many videos in one course".into()))?;
        if !already_linked.contains(youtube_id) {
            db.store_item(CourseVideo::new(
                course_id.to_string(),
                youtube_id.clone(),
                position,
            ))
            .await?;
        }

        let last_job = CourseJob::latest_for_course_video(db, course_id, youtube_id).await?;
        if let Some(failed) = last_job.filter(|job| job.status == JobStatus::Failed) {
            let requeued = failed.requeue(db).await?;
            debug!(course_id, video_id = %youtube_id, job_id = %requeued.id, "failed job requeued");
            outcome.enqueued.push(youtube_id.clone());
            continue;
        }

        let job = CourseJob::new(
            course_id.to_string(),
            youtube_id.clone(),
            params.difficulty,
            params.question_count,
            params.summary_detail,
        );
        match job.create_unless_active(db).await? {
            Some(created) => {
                debug!(course_id, video_id = %youtube_id, job_id = %created.id, "job enqueued");
                outcome.enqueued.push(youtube_id.clone());
            }
            None => {
                debug!(course_id, video_id = %youtube_id, "active job exists, skipping");
                outcome.skipped.push(youtube_id.clone());
            }
        }
    }

    info!(
        course_id,
        enqueued = outcome.enqueued.len(),
        skipped = outcome.skipped.len(),
        "course videos enqueued"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use common::storage::types::course_video::CourseVideo;
    use uuid::Uuid;

    use super::*;

    async fn setup_db() -> SurrealDbClient {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("ingest_test", &database)
            .await
            .expect("Failed to create in-memory SurrealDB");
        db.ensure_initialized(8)
            .await
            .expect("Failed to initialize schema");
        db
    }

    fn params() -> JobParams {
        JobParams {
            difficulty: 3,
            question_count: 6,
            summary_detail: 2,
        }
    }

    #[tokio::test]
    async fn enqueue_links_videos_in_order_and_creates_jobs() {
        let db = setup_db().await;
        let ids = vec!["vidA".to_string(), "vidB".to_string(), "vidC".to_string()];

        let outcome = enqueue_course_videos(&db, "course-1", &ids, params())
            .await
            .expect("enqueue succeeds");
        assert_eq!(outcome.enqueued, ids);
        assert!(outcome.skipped.is_empty());

        let linked = CourseVideo::video_ids_for_course(&db, "course-1")
            .await
            .expect("links fetched");
        assert_eq!(linked, ids);

        let job = CourseJob::claim_next_ready(&db, "worker-a")
            .await
            .expect("claim succeeds")
            .expect("job available");
        assert_eq!(job.course_id, "course-1");
        assert_eq!(job.difficulty, 3);
        assert_eq!(job.question_count, 6);
    }

    #[tokio::test]
    async fn enqueue_skips_videos_with_active_jobs() {
        let db = setup_db().await;
        let ids = vec!["vidA".to_string()];

        let first = enqueue_course_videos(&db, "course-1", &ids, params())
            .await
            .expect("first enqueue");
        assert_eq!(first.enqueued, ids);

        let second = enqueue_course_videos(&db, "course-1", &ids, params())
            .await
            .expect("second enqueue");
        assert!(second.enqueued.is_empty());
        assert_eq!(second.skipped, ids);

        let linked = CourseVideo::video_ids_for_course(&db, "course-1")
            .await
            .expect("links fetched");
        assert_eq!(linked, ids, "re-enqueue must not duplicate course links");
    }

    #[tokio::test]
    async fn enqueue_requeues_failed_jobs_on_the_same_row() {
        let db = setup_db().await;
        let ids = vec!["vidA".to_string()];

        enqueue_course_videos(&db, "course-1", &ids, params())
            .await
            .expect("first enqueue");
        let claimed = CourseJob::claim_next_ready(&db, "worker-a")
            .await
            .expect("claim succeeds")
            .expect("job available");
        claimed
            .mark_failed("no captions", &db)
            .await
            .expect("job failed");

        let second = enqueue_course_videos(&db, "course-1", &ids, params())
            .await
            .expect("second enqueue");
        assert_eq!(second.enqueued, ids, "failed video must be re-enqueued");
        assert!(second.skipped.is_empty());

        let reclaimed = CourseJob::claim_next_ready(&db, "worker-b")
            .await
            .expect("claim succeeds")
            .expect("job available");
        assert_eq!(reclaimed.id, claimed.id, "requeue reuses the existing row");
        assert!(reclaimed.error_message.is_none());

        let all_jobs: Vec<CourseJob> = db
            .get_all_stored_items()
            .await
            .expect("jobs fetched");
        assert_eq!(all_jobs.len(), 1, "requeue must not create a second job row");
    }
}
