use std::sync::Arc;

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::{db::SurrealDbClient, types::quiz::QuizQuestion, types::transcript_chunk::TranscriptChunk},
    utils::{config::AppConfig, embedding::EmbeddingProvider, youtube::YoutubeClient},
};
use retrieval_pipeline::{num_chunks_to_retrieve, relevant_chunks};

use super::context::VideoBundle;
use crate::{
    chunk_store::{store_transcript_chunks, PartialBatchResult},
    generation::ContentGenerator,
    llm_instructions::GENERAL_QUERIES,
};

#[async_trait]
pub trait JobServices: Send + Sync {
    async fn fetch_bundle(&self, youtube_id: &str) -> Result<VideoBundle, AppError>;

    async fn store_chunks(
        &self,
        video_id: &str,
        transcript: &str,
    ) -> Result<PartialBatchResult, AppError>;

    async fn retrieve_chunks(
        &self,
        video_id: &str,
        transcript: &str,
    ) -> Result<Vec<TranscriptChunk>, AppError>;

    async fn generate_summary(&self, text: &str, summary_detail: i64)
        -> Result<String, AppError>;

    async fn generate_quiz(
        &self,
        text: &str,
        difficulty: i64,
        question_count: i64,
    ) -> Result<Vec<QuizQuestion>, AppError>;
}

pub struct DefaultJobServices {
    db: Arc<SurrealDbClient>,
    youtube: YoutubeClient,
    embedding_provider: Arc<EmbeddingProvider>,
    generator: ContentGenerator,
    retry_attempts: usize,
}

impl DefaultJobServices {
    pub fn new(
        db: Arc<SurrealDbClient>,
        youtube: YoutubeClient,
        embedding_provider: Arc<EmbeddingProvider>,
        generator: ContentGenerator,
        config: &AppConfig,
    ) -> Self {
        Self {
            db,
            youtube,
            embedding_provider,
            generator,
            retry_attempts: config.embedding_retry_attempts,
        }
    }
}

#[async_trait]
impl JobServices for DefaultJobServices {
    async fn fetch_bundle(&self, youtube_id: &str) -> Result<VideoBundle, AppError> {
        let metadata = self.youtube.fetch_video(youtube_id).await?;

        let (channel_thumbnail, transcript) = tokio::join!(
            self.youtube.fetch_channel_thumbnail(&metadata.channel_id),
            self.youtube.fetch_captions(youtube_id),
        );

        Ok(VideoBundle {
            metadata,
            channel_thumbnail: channel_thumbnail?,
            transcript: transcript?,
        })
    }

    async fn store_chunks(
        &self,
        video_id: &str,
        transcript: &str,
    ) -> Result<PartialBatchResult, AppError> {
        store_transcript_chunks(
            &self.db,
            &self.embedding_provider,
            video_id,
            transcript,
            self.retry_attempts,
        )
        .await
    }

    async fn retrieve_chunks(
        &self,
        video_id: &str,
        transcript: &str,
    ) -> Result<Vec<TranscriptChunk>, AppError> {
        let take = num_chunks_to_retrieve(transcript.split_whitespace().count());
        let queries: Vec<String> = GENERAL_QUERIES.iter().map(|q| (*q).to_string()).collect();

        relevant_chunks(
            &self.db,
            &self.embedding_provider,
            video_id,
            &queries,
            take,
            self.retry_attempts,
        )
        .await
    }

    async fn generate_summary(
        &self,
        text: &str,
        summary_detail: i64,
    ) -> Result<String, AppError> {
        self.generator.generate_final_summary(text, summary_detail).await
    }

    async fn generate_quiz(
        &self,
        text: &str,
        difficulty: i64,
        question_count: i64,
    ) -> Result<Vec<QuizQuestion>, AppError> {
        self.generator
            .generate_quiz(text, difficulty, question_count)
            .await
    }
}
