use std::sync::Arc;

use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider, youtube::YoutubeClient},
};
use ingestion_pipeline::{generation::ContentGenerator, run_worker_loop, CoursePipeline};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    let embedding_provider = Arc::new(EmbeddingProvider::from_config(
        &config,
        Some(openai_client.clone()),
    )?);

    db.ensure_initialized(embedding_provider.dimension()).await?;

    let generator = ContentGenerator::new(openai_client.clone(), config.chat_model.clone());
    let youtube = YoutubeClient::new(
        config.youtube_api_key.clone(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    )?;

    let course_pipeline = Arc::new(CoursePipeline::new(
        db.clone(),
        youtube,
        embedding_provider,
        generator,
        &config,
    ));

    run_worker_loop(db, course_pipeline).await
}
