use std::{sync::Arc, time::Duration};

use async_openai::{config::OpenAIConfig, Client};
use common::{
    error::AppError,
    storage::db::SurrealDbClient,
    utils::{config::AppConfig, stripe::StripeClient, youtube::YoutubeClient},
};
use ingestion_pipeline::{generation::ContentGenerator, CoursePipeline};

#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub openai_client: Arc<Client<OpenAIConfig>>,
    pub generator: ContentGenerator,
    pub stripe: StripeClient,
    pub youtube: YoutubeClient,
    pub pipeline: Arc<CoursePipeline>,
}

impl ApiState {
    pub fn new(
        config: &AppConfig,
        db: Arc<SurrealDbClient>,
        openai_client: Arc<Client<OpenAIConfig>>,
        pipeline: Arc<CoursePipeline>,
    ) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let generator = ContentGenerator::new(Arc::clone(&openai_client), config.chat_model.clone());
        let stripe = StripeClient::new(config.stripe_secret_key.clone(), timeout)?;
        let youtube = YoutubeClient::new(config.youtube_api_key.clone(), timeout)?;

        Ok(Self {
            db,
            config: config.clone(),
            openai_client,
            generator,
            stripe,
            youtube,
            pipeline,
        })
    }
}
