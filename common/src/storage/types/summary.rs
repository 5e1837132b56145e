use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

stored_object!(Summary, "summary", {
    video_id: String,
    course_id: String,
    content: String
});

impl Summary {
    pub fn new(video_id: String, course_id: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            video_id,
            course_id,
            content,
        }
    }

    pub async fn find_by_video(
        db: &SurrealDbClient,
        video_id: &str,
    ) -> Result<Option<Summary>, AppError> {
        let summary: Option<Summary> = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE video_id = $video_id \
                 ORDER BY created_at DESC LIMIT 1",
            )
            .bind(("table", Self::table_name()))
            .bind(("video_id", video_id.to_string()))
            .await?
            .take(0)?;
        Ok(summary)
    }

    /// Number of distinct videos in the given set that have a summary.
    pub async fn count_summarized_videos(
        db: &SurrealDbClient,
        video_ids: &[String],
    ) -> Result<usize, AppError> {
        if video_ids.is_empty() {
            return Ok(0);
        }

        #[derive(Deserialize)]
        struct VideoIdRow {
            video_id: String,
        }

        let rows: Vec<VideoIdRow> = db
            .client
            .query(
                "SELECT video_id FROM type::table($table) WHERE video_id IN $video_ids \
                 GROUP BY video_id",
            )
            .bind(("table", Self::table_name()))
            .bind(("video_ids", video_ids.to_vec()))
            .await?
            .take(0)?;

        Ok(rows.len())
    }

    pub async fn delete_by_video_ids(
        db: &SurrealDbClient,
        video_ids: &[String],
    ) -> Result<(), AppError> {
        if video_ids.is_empty() {
            return Ok(());
        }
        db.client
            .query("DELETE type::table($table) WHERE video_id IN $video_ids")
            .bind(("table", Self::table_name()))
            .bind(("video_ids", video_ids.to_vec()))
            .await?;
        Ok(())
    }
}
