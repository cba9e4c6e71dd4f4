mod config;
mod errors;
mod extraction;
mod generation;
mod llm_client;
mod models;
mod resume;
mod routes;
mod schema;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::pipeline::AnalysisPipeline;
use crate::llm_client::{OllamaClient, TextGenerator};
use crate::routes::build_router;
use crate::session::AnalysisGuard;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Assistant API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the generation service client
    let generator: Arc<dyn TextGenerator> = Arc::new(
        OllamaClient::new(
            config.ollama_base_url.clone(),
            config.ollama_model.clone(),
            config.ollama_temperature,
            config.generation_timeout(),
        )
        .context("Failed to build Ollama client")?,
    );
    info!(
        "LLM client initialized (model: {}, endpoint: {}, timeout: {}s)",
        generator.model(),
        config.ollama_base_url,
        config.generation_timeout_secs
    );

    // Build app state
    let state = AppState {
        pipeline: AnalysisPipeline::new(generator, config.generation_timeout()),
        guard: AnalysisGuard::new(),
    };

    // Build router
    let app = build_router(state, config.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
