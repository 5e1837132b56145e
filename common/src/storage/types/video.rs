use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

stored_object!(Video, "video", {
    title: String,
    description: String,
    channel_title: String,
    channel_thumbnail: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    transcript: Option<String>
});

impl Video {
    /// The record id is the YouTube video id, so re-ingesting the same video
    /// overwrites rather than duplicates.
    pub fn new(
        youtube_id: String,
        title: String,
        description: String,
        channel_title: String,
        channel_thumbnail: Option<String>,
        thumbnail: Option<String>,
        transcript: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: youtube_id,
            created_at: now,
            updated_at: now,
            title,
            description,
            channel_title,
            channel_thumbnail,
            thumbnail,
            transcript,
        }
    }

    /// Upsert by YouTube id. A plain `CREATE` would reject re-ingestion of a
    /// video that already exists.
    pub async fn upsert(&self, db: &SurrealDbClient) -> Result<(), AppError> {
        let _: Option<Video> = db
            .client
            .upsert((Self::table_name(), self.id.as_str()))
            .content(self.clone())
            .await?;
        Ok(())
    }

    pub async fn delete_many(db: &SurrealDbClient, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }
        db.client
            .query("DELETE type::table($table) WHERE record::id(id) IN $ids")
            .bind(("table", Self::table_name()))
            .bind(("ids", ids.to_vec()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_upsert_overwrites_existing_video() {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb");

        let video = Video::new(
            "dQw4w9WgXcQ".to_string(),
            "First title".to_string(),
            "Description".to_string(),
            "Channel".to_string(),
            None,
            None,
            Some("hello world transcript".to_string()),
        );
        video.upsert(&db).await.expect("Failed to upsert video");

        let mut updated = video.clone();
        updated.title = "Second title".to_string();
        updated.upsert(&db).await.expect("Failed to upsert again");

        let fetched: Option<Video> = db.get_item(&video.id).await.expect("Failed to fetch");
        let fetched = fetched.expect("video exists");
        assert_eq!(fetched.title, "Second title");

        let all: Vec<Video> = db
            .get_all_stored_items()
            .await
            .expect("Failed to fetch all");
        assert_eq!(all.len(), 1, "Upsert must not duplicate the record");
    }

    #[tokio::test]
    async fn test_delete_many_removes_only_the_given_ids() {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("Failed to start in-memory surrealdb");

        for id in ["vid_a", "vid_b", "vid_c"] {
            Video::new(
                id.to_string(),
                format!("Title {id}"),
                String::new(),
                "Channel".to_string(),
                None,
                None,
                None,
            )
            .upsert(&db)
            .await
            .expect("Failed to store video");
        }

        let subset = vec!["vid_a".to_string(), "vid_c".to_string()];
        Video::delete_many(&db, &subset)
            .await
            .expect("Failed to delete subset");
        let remaining: Vec<Video> = db
            .get_all_stored_items()
            .await
            .expect("Failed to fetch all");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "vid_b");
    }
}
