use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::transcript_chunk::TranscriptChunk},
    utils::embedding::EmbeddingProvider,
};
use futures::{stream, StreamExt};
use retrieval_pipeline::{chunk_transcript, MAX_WORDS_PER_CHUNK};
use tracing::{debug, warn};

/// Concurrency ceiling for embedding calls within one batch.
const CHUNK_EMBED_CONCURRENCY: usize = 8;

/// Outcome of a best-effort chunk batch: how many chunks landed, and the
/// indices of chunks that did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialBatchResult {
    pub stored: usize,
    pub failed: Vec<usize>,
}

impl PartialBatchResult {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Chunk a transcript, embed each chunk, and persist the results.
///
/// Embedding and storage failures are per-chunk: a bad chunk is reported in
/// `failed` rather than aborting the batch, so a mostly-ingested video stays
/// usable for retrieval.
pub async fn store_transcript_chunks(
    db: &SurrealDbClient,
    provider: &EmbeddingProvider,
    video_id: &str,
    transcript: &str,
    retry_attempts: usize,
) -> Result<PartialBatchResult, AppError> {
    let chunks = chunk_transcript(transcript, MAX_WORDS_PER_CHUNK);
    if chunks.is_empty() {
        return Ok(PartialBatchResult {
            stored: 0,
            failed: Vec::new(),
        });
    }

    let outcomes: Vec<(usize, Result<(), AppError>)> =
        stream::iter(chunks.into_iter().enumerate().map(|(index, content)| {
            async move {
                let result = async {
                    let chunk_index = i64::try_from(index)
                        .map_err(|_| AppError::Validation("chunk index overflow".into()))?;
                    let embedding = provider.embed_with_retry(&content, retry_attempts).await?;
                    db.store_item(TranscriptChunk::new(
                        video_id.to_string(),
                        chunk_index,
                        content,
                        embedding,
                    ))
                    .await?;
                    Ok(())
                }
                .await;
                (index, result)
            }
        }))
        .buffer_unordered(CHUNK_EMBED_CONCURRENCY)
        .collect()
        .await;

    let mut stored = 0;
    let mut failed = Vec::new();
    for (index, result) in outcomes {
        match result {
            Ok(()) => stored += 1,
            Err(err) => {
                eprintln!("DEBUG chunk {index} failed: {err:?}");
                warn!(video_id, chunk_index = index, error = %err, "Chunk failed to store");
                failed.push(index);
            }
        }
    }
    failed.sort_unstable();

    debug!(video_id, stored, failed = failed.len(), "Chunk batch finished");
    Ok(PartialBatchResult { stored, failed })
}
