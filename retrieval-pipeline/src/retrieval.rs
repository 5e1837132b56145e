use std::collections::HashSet;

use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::transcript_chunk::TranscriptChunk},
    utils::embedding::EmbeddingProvider,
};
use tracing::warn;

/// Gather the chunks most relevant to a set of queries for one video.
///
/// Each query is embedded and searched independently; a query whose embedding
/// or search fails is skipped rather than sinking the whole retrieval.
/// Results are deduplicated by chunk id, keeping first occurrence so earlier
/// queries take precedence in the returned ordering.
pub async fn relevant_chunks(
    db: &SurrealDbClient,
    provider: &EmbeddingProvider,
    video_id: &str,
    queries: &[String],
    take_per_query: usize,
    retry_attempts: usize,
) -> Result<Vec<TranscriptChunk>, AppError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut collected = Vec::new();

    for query in queries {
        let embedding = match provider.embed_with_retry(query, retry_attempts).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(video_id, query, error = %err, "Skipping query, embedding failed");
                continue;
            }
        };

        let chunks = match TranscriptChunk::vector_search_for_video(
            db,
            video_id,
            embedding,
            take_per_query,
        )
        .await
        {
            Ok(chunks) => chunks,
            Err(err) => {
                warn!(video_id, query, error = %err, "Skipping query, vector search failed");
                continue;
            }
        };

        for chunk in chunks {
            if seen.insert(chunk.id.clone()) {
                collected.push(chunk);
            }
        }
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const TEST_DIMENSION: usize = 8;

    async fn seeded_db(provider: &EmbeddingProvider) -> SurrealDbClient {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .expect("in-memory surrealdb");
        db.ensure_initialized(TEST_DIMENSION)
            .await
            .expect("schema init");

        for (video_id, chunk_index, content) in [
            ("video_a", 0, "rust ownership moves values between bindings"),
            ("video_a", 1, "the borrow checker enforces aliasing rules"),
            ("video_a", 2, "cargo builds and tests rust projects"),
            ("video_b", 0, "rust ownership moves values between bindings"),
        ] {
            let embedding = provider.embed(content).await.expect("embed");
            db.store_item(TranscriptChunk::new(
                video_id.to_string(),
                chunk_index,
                content.to_string(),
                embedding,
            ))
            .await
            .expect("store chunk");
        }

        db
    }

    #[tokio::test]
    async fn test_relevant_chunks_deduplicates_across_queries() {
        let provider = EmbeddingProvider::new_hashed(TEST_DIMENSION);
        let db = seeded_db(&provider).await;

        // Identical queries would each pull the same chunks back
        let queries = vec![
            "rust ownership moves values".to_string(),
            "rust ownership moves values".to_string(),
        ];
        let chunks = relevant_chunks(&db, &provider, "video_a", &queries, 2, 0)
            .await
            .expect("retrieval");

        let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), chunks.len(), "No duplicate chunk ids");
        assert!(chunks.len() <= 2, "Dedup keeps first-query results only");
    }

    #[tokio::test]
    async fn test_relevant_chunks_scoped_to_video() {
        let provider = EmbeddingProvider::new_hashed(TEST_DIMENSION);
        let db = seeded_db(&provider).await;

        let queries = vec!["rust ownership moves values between bindings".to_string()];
        let chunks = relevant_chunks(&db, &provider, "video_a", &queries, 10, 0)
            .await
            .expect("retrieval");

        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.video_id == "video_a"));
    }

    #[tokio::test]
    async fn test_relevant_chunks_empty_queries() {
        let provider = EmbeddingProvider::new_hashed(TEST_DIMENSION);
        let db = seeded_db(&provider).await;

        let chunks = relevant_chunks(&db, &provider, "video_a", &[], 5, 0)
            .await
            .expect("retrieval");
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_relevant_chunks_merges_distinct_queries() {
        let provider = EmbeddingProvider::new_hashed(TEST_DIMENSION);
        let db = seeded_db(&provider).await;

        let queries = vec![
            "borrow checker aliasing".to_string(),
            "cargo builds projects".to_string(),
        ];
        let chunks = relevant_chunks(&db, &provider, "video_a", &queries, 1, 0)
            .await
            .expect("retrieval");

        // One nearest chunk per query, deduplicated
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 2);
        let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), chunks.len());
    }
}
