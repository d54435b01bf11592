mod render;
mod routes;
mod upload;

use std::sync::Arc;

use anyhow::{Context, Result};
use paper_analyzer::{AppConfig, StudyPipeline};
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    tokio::fs::create_dir_all(&config.temp_dir)
        .await
        .with_context(|| format!("cannot create upload directory {}", config.temp_dir.display()))?;

    let pipeline = StudyPipeline::from_config(&config)?;
    let state = Arc::new(AppState::new(pipeline)?);
    log::info!(
        "Analyzer ready: model {}, {}-{} uploads, {} videos per topic",
        config.gemini.model,
        config.pipeline.min_uploads,
        config.pipeline.max_uploads,
        config.pipeline.max_results
    );

    let app = routes::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
