use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

stored_object!(CourseVideo, "course_video", {
    course_id: String,
    video_id: String,
    position: i64
});

impl CourseVideo {
    pub fn new(course_id: String, video_id: String, position: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            course_id,
            video_id,
            position,
        }
    }

    /// Video ids for a course in playlist order.
    pub async fn video_ids_for_course(
        db: &SurrealDbClient,
        course_id: &str,
    ) -> Result<Vec<String>, AppError> {
        #[derive(Deserialize)]
        struct VideoIdRow {
            video_id: String,
        }

        let rows: Vec<VideoIdRow> = db
            .client
            .query(
                "SELECT video_id, position FROM type::table($table) WHERE course_id = $course_id \
                 ORDER BY position ASC",
            )
            .bind(("table", Self::table_name()))
            .bind(("course_id", course_id.to_string()))
            .await?
            .take(0)?;

        Ok(rows.into_iter().map(|row| row.video_id).collect())
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
