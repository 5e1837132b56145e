use std::{sync::Arc, time::Duration};

use api_router::{api_routes_v1, api_state::ApiState};
use axum::Router;
use common::{
    storage::db::SurrealDbClient,
    utils::{config::get_config, embedding::EmbeddingProvider, youtube::YoutubeClient},
};
use ingestion_pipeline::{generation::ContentGenerator, run_worker_loop, CoursePipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Combined entrypoint: HTTP server and background worker in one process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
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
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        "Embedding provider initialized"
    );

    // Ensure db is initialized with indexes sized for the provider
    db.ensure_initialized(embedding_provider.dimension()).await?;

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let generator = ContentGenerator::new(openai_client.clone(), config.chat_model.clone());
    let youtube = YoutubeClient::new(config.youtube_api_key.clone(), timeout)?;

    let pipeline = Arc::new(CoursePipeline::new(
        db.clone(),
        youtube,
        embedding_provider,
        generator,
        &config,
    ));

    let api_state = ApiState::new(&config, db.clone(), openai_client, pipeline.clone())?;

    // Create Axum router
    let app = Router::new()
        .merge(api_routes_v1(&api_state))
        .with_state(api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Starting worker process");
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = run_worker_loop(db, pipeline).await {
            error!("Worker process error: {}", e);
        }
    });

    let _ = tokio::try_join!(server_handle, worker_handle)?;

    Ok(())
}
