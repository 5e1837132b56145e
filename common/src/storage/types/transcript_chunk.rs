use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};
use uuid::Uuid;

stored_object!(TranscriptChunk, "transcript_chunk", {
    video_id: String,
    chunk_index: i64,
    content: String,
    embedding: Vec<f32>
});

impl TranscriptChunk {
    /// `chunk_index` is the chunk's ordinal within its video's transcript,
    /// so transcript order survives concurrent ingestion.
    pub fn new(video_id: String, chunk_index: i64, content: String, embedding: Vec<f32>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            video_id,
            chunk_index,
            content,
            embedding,
        }
    }

    /// Nearest-neighbour search over one video's chunks via the HNSW index.
    ///
    /// The KNN operator takes its parameters as literals, so `take` is
    /// formatted into the query; everything else is bound.
    pub async fn vector_search_for_video(
        db: &SurrealDbClient,
        video_id: &str,
        embedding: Vec<f32>,
        take: usize,
    ) -> Result<Vec<TranscriptChunk>, AppError> {
        let query = format!(
            "SELECT *, vector::distance::knn() AS distance FROM type::table($table) \
             WHERE video_id = $video_id AND embedding <|{take},40|> $embedding \
             ORDER BY distance"
        );

        let chunks: Vec<TranscriptChunk> = db
            .client
            .query(query)
            .bind(("table", Self::table_name()))
            .bind(("video_id", video_id.to_string()))
            .bind(("embedding", embedding))
            .await?
            .take(0)?;

        Ok(chunks)
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
