mod analysis;
mod config;
mod documents;
mod errors;
mod history;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::history::{HistoryStore, RedisStore};
use crate::llm_client::gemini::GeminiEndpoint;
use crate::llm_client::GenerationClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResuMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let history = HistoryStore::new(Arc::new(RedisStore::new(redis)));
    info!("Redis client initialized");

    // Initialize generation client
    let endpoint = GeminiEndpoint::new(
        config.gemini_api_key.clone(),
        config.gemini_base_url.clone(),
    )?;
    let llm = GenerationClient::new(Arc::new(endpoint), config.client_config());
    info!("Generation client initialized (model: {})", llm.model());

    let state = AppState { llm, history };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the deployed frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
