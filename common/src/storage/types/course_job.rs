use state_machines::state_machine;
use surrealdb::sql::Datetime as SurrealDatetime;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum JobTransition {
    Start,
    Complete,
    Fail,
    Requeue,
}

impl JobTransition {
    fn as_str(&self) -> &'static str {
        match self {
            JobTransition::Start => "start",
            JobTransition::Complete => "complete",
            JobTransition::Fail => "fail",
            JobTransition::Requeue => "requeue",
        }
    }
}

mod lifecycle {
    use super::state_machine;

    state_machine! {
        name: JobLifecycleMachine,
        initial: Pending,
        states: [Pending, Processing, Completed, Failed],
        events {
            start {
                transition: { from: Pending, to: Processing }
            }
            complete {
                transition: { from: Processing, to: Completed }
            }
            fail {
                transition: { from: Pending, to: Failed }
                transition: { from: Processing, to: Failed }
            }
            requeue {
                transition: { from: Failed, to: Pending }
            }
        }
    }

    pub(super) fn pending() -> JobLifecycleMachine<(), Pending> {
        JobLifecycleMachine::new(())
    }
}

fn invalid_transition(status: &JobStatus, event: JobTransition) -> AppError {
    AppError::Validation(format!(
        "Invalid job transition: {} -> {}",
        status.as_str(),
        event.as_str()
    ))
}

/// Replay the lifecycle on the typed machine so only transitions the
/// `state_machine!` definition allows can produce a next status.
fn compute_next_status(status: &JobStatus, event: JobTransition) -> Result<JobStatus, AppError> {
    use lifecycle::pending;
    let rejected = || invalid_transition(status, event);
    match (status, event) {
        (JobStatus::Pending, JobTransition::Start) => pending()
            .start()
            .map(|_| JobStatus::Processing)
            .map_err(|_| rejected()),
        (JobStatus::Processing, JobTransition::Complete) => pending()
            .start()
            .map_err(|_| rejected())
            .and_then(|machine| machine.complete().map_err(|_| rejected()))
            .map(|_| JobStatus::Completed),
        (JobStatus::Pending, JobTransition::Fail) => pending()
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| rejected()),
        (JobStatus::Processing, JobTransition::Fail) => pending()
            .start()
            .map_err(|_| rejected())
            .and_then(|machine| machine.fail().map_err(|_| rejected()))
            .map(|_| JobStatus::Failed),
        (JobStatus::Failed, JobTransition::Requeue) => pending()
            .fail()
            .map_err(|_| rejected())
            .and_then(|machine| machine.requeue().map_err(|_| rejected()))
            .map(|_| JobStatus::Pending),
        _ => Err(rejected()),
    }
}

stored_object!(CourseJob, "course_job", {
    course_id: String,
    video_id: String,
    status: JobStatus,
    difficulty: i64,
    question_count: i64,
    summary_detail: i64,
    worker_id: Option<String>,
    error_message: Option<String>
});

impl CourseJob {
    pub fn new(
        course_id: String,
        video_id: String,
        difficulty: i64,
        question_count: i64,
        summary_detail: i64,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            course_id,
            video_id,
            status: JobStatus::Pending,
            difficulty,
            question_count,
            summary_detail,
            worker_id: None,
            error_message: None,
        }
    }

    /// Enqueue a job unless an active (pending or processing) job already
    /// exists for the same course/video pair. Returns `None` when refused.
    pub async fn create_unless_active(
        self,
        db: &SurrealDbClient,
    ) -> Result<Option<CourseJob>, AppError> {
        const CREATE_QUERY: &str = r#"
            IF (
                SELECT * FROM type::table($table)
                WHERE course_id = $course_id
                  AND video_id = $video_id
                  AND status IN $active_statuses
                LIMIT 1
            ) IS [] THEN
                (CREATE type::thing($table, $id) CONTENT $job)
            ELSE
                []
            END;
        "#;

        let mut result = db
            .client
            .query(CREATE_QUERY)
            .bind(("table", Self::table_name()))
            .bind(("course_id", self.course_id.clone()))
            .bind(("video_id", self.video_id.clone()))
            .bind((
                "active_statuses",
                vec![JobStatus::Pending.as_str(), JobStatus::Processing.as_str()],
            ))
            .bind(("id", self.id.clone()))
            .bind(("job", self))
            .await?;

        let created: Option<CourseJob> = result.take(0)?;
        Ok(created)
    }

    /// Atomically claim the oldest pending job for this worker. At most one
    /// worker wins a given job; losers see `None`.
    pub async fn claim_next_ready(
        db: &SurrealDbClient,
        worker_id: &str,
    ) -> Result<Option<CourseJob>, AppError> {
        debug_assert!(compute_next_status(&JobStatus::Pending, JobTransition::Start).is_ok());

        const CLAIM_QUERY: &str = r#"
            UPDATE (
                SELECT * FROM type::table($table)
                WHERE status = $pending
                ORDER BY created_at ASC
                LIMIT 1
            )
            SET status = $processing,
                worker_id = $worker_id,
                updated_at = $now
            RETURN *;
        "#;

        let now = chrono::Utc::now();
        let mut result = db
            .client
            .query(CLAIM_QUERY)
            .bind(("table", Self::table_name()))
            .bind(("pending", JobStatus::Pending.as_str()))
            .bind(("processing", JobStatus::Processing.as_str()))
            .bind(("worker_id", worker_id.to_string()))
            .bind(("now", SurrealDatetime::from(now)))
            .await?;

        let job: Option<CourseJob> = result.take(0)?;
        Ok(job)
    }

    pub async fn mark_completed(&self, db: &SurrealDbClient) -> Result<CourseJob, AppError> {
        let next = compute_next_status(&self.status, JobTransition::Complete)?;
        debug_assert_eq!(next, JobStatus::Completed);

        const COMPLETE_QUERY: &str = r#"
            UPDATE type::thing($table, $id)
            SET status = $completed,
                worker_id = NONE,
                error_message = NONE,
                updated_at = $now
            WHERE status = $processing AND worker_id = $worker_id
            RETURN *;
        "#;

        let now = chrono::Utc::now();
        let mut result = db
            .client
            .query(COMPLETE_QUERY)
            .bind(("table", Self::table_name()))
            .bind(("id", self.id.clone()))
            .bind(("completed", JobStatus::Completed.as_str()))
            .bind(("processing", JobStatus::Processing.as_str()))
            .bind(("now", SurrealDatetime::from(now)))
            .bind(("worker_id", self.worker_id.clone().unwrap_or_default()))
            .await?;

        let updated: Option<CourseJob> = result.take(0)?;
        updated.ok_or_else(|| invalid_transition(&self.status, JobTransition::Complete))
    }

    pub async fn mark_failed(
        &self,
        error_message: &str,
        db: &SurrealDbClient,
    ) -> Result<CourseJob, AppError> {
        let next = compute_next_status(&self.status, JobTransition::Fail)?;
        debug_assert_eq!(next, JobStatus::Failed);

        const FAIL_QUERY: &str = r#"
            UPDATE type::thing($table, $id)
            SET status = $failed,
                worker_id = NONE,
                error_message = $error_message,
                updated_at = $now
            WHERE status IN $from_statuses
            RETURN *;
        "#;

        let now = chrono::Utc::now();
        let mut result = db
            .client
            .query(FAIL_QUERY)
            .bind(("table", Self::table_name()))
            .bind(("id", self.id.clone()))
            .bind(("failed", JobStatus::Failed.as_str()))
            .bind((
                "from_statuses",
                vec![JobStatus::Pending.as_str(), JobStatus::Processing.as_str()],
            ))
            .bind(("error_message", error_message.to_string()))
            .bind(("now", SurrealDatetime::from(now)))
            .await?;

        let updated: Option<CourseJob> = result.take(0)?;
        updated.ok_or_else(|| invalid_transition(&self.status, JobTransition::Fail))
    }

    /// Put a failed job back in the queue for another attempt.
    pub async fn requeue(&self, db: &SurrealDbClient) -> Result<CourseJob, AppError> {
        compute_next_status(&self.status, JobTransition::Requeue)?;

        const REQUEUE_QUERY: &str = r#"
            UPDATE type::thing($table, $id)
            SET status = $pending,
                worker_id = NONE,
                error_message = NONE,
                updated_at = $now
            WHERE status = $failed
            RETURN *;
        "#;

        let now = chrono::Utc::now();
        let mut result = db
            .client
            .query(REQUEUE_QUERY)
            .bind(("table", Self::table_name()))
            .bind(("id", self.id.clone()))
            .bind(("pending", JobStatus::Pending.as_str()))
            .bind(("failed", JobStatus::Failed.as_str()))
            .bind(("now", SurrealDatetime::from(now)))
            .await?;

        let updated: Option<CourseJob> = result.take(0)?;
        updated.ok_or_else(|| invalid_transition(&self.status, JobTransition::Requeue))
    }

    /// Most recently created job for a course, regardless of status.
    pub async fn latest_for_course(
        db: &SurrealDbClient,
        course_id: &str,
    ) -> Result<Option<CourseJob>, AppError> {
        let job: Option<CourseJob> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE course_id = $course_id \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("table", Self::table_name()))
            .bind(("course_id", course_id.to_string()))
            .await?
            .take(0)?;
        Ok(job)
    }

    /// Most recently created job for one (course, video) pair.
    pub async fn latest_for_course_video(
        db: &SurrealDbClient,
        course_id: &str,
        video_id: &str,
    ) -> Result<Option<CourseJob>, AppError> {
        let job: Option<CourseJob> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE course_id = $course_id \
                 AND video_id = $video_id ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("table", Self::table_name()))
            .bind(("course_id", course_id.to_string()))
            .bind(("video_id", video_id.to_string()))
            .await?
            .take(0)?;
        Ok(job)
    }

    pub async fn delete_by_course(db: &SurrealDbClient, course_id: &str) -> Result<(), AppError> {
        db.client
            .query("DELETE type::table($table) WHERE course_id = $course_id")
            .bind(("table", Self::table_name()))
            .bind(("course_id", course_id.to_string()))
            .await?;
        Ok(())
    }
}
