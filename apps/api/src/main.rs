mod billing;
mod config;
mod db;
mod errors;
mod history;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::billing::ledger::PgPlanLedger;
use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::llm_client::LlmClient;
use crate::matching::engine::ClaudeMatchEngine;
use crate::matching::session::SessionRegistry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Match API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    init_schema(&pool).await?;

    // Initialize LLM client and the collaborator built on it
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let engine = Arc::new(ClaudeMatchEngine::new(llm));

    // Initialize plan ledger and session registry
    let ledger = Arc::new(PgPlanLedger::new(pool.clone()));
    let sessions = Arc::new(SessionRegistry::new());

    // Build app state
    let state = AppState {
        db: pool,
        sessions,
        engine,
        ledger,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
