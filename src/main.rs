//! tablebot - restaurant reservation chat agent
//!
//! A finite-state booking dialogue whose decisions are delegated to hosted
//! language-model calls, served over a small HTTP API.

mod api;
mod config;
mod db;
mod extract;
mod intent;
mod llm;
mod moderation;
mod nlu;
mod runtime;
mod state_machine;

use api::{create_router, AppState, HealthReport};
use config::ServerConfig;
use db::Database;
use llm::{LlmConfig, ModelRegistry};
use moderation::ModerationGate;
use nlu::LlmNlu;
use runtime::{ConversationRuntime, DatabaseStorage, MemoryStorage, Nlu, Storage, UnavailableStorage};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablebot=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    let config = ServerConfig::from_env();

    let (storage, store_ready) = open_storage(&config);

    // Initialize LLM registry
    let llm_config = LlmConfig::from_env();
    let llm_registry = ModelRegistry::new(&llm_config);

    if llm_registry.has_models() {
        tracing::info!(
            models = ?llm_registry.available_models(),
            default = %llm_registry.default_model_id(),
            "LLM registry initialized"
        );
    } else {
        tracing::warn!("No LLM API keys configured. Set GOOGLE_API_KEY, ANTHROPIC_API_KEY or LLM_GATEWAY.");
    }

    let llm_nlu = LlmNlu::new(&llm_registry);
    let nlu_ready = llm_nlu.is_ready();
    let nlu: Arc<dyn Nlu> = Arc::new(llm_nlu);

    let gate = ModerationGate::with_default_blocklist(config.call_timeout)?;

    let health = HealthReport::from_readiness(nlu_ready, store_ready);
    if !health.is_healthy() {
        tracing::warn!(?health, "Starting with subsystems unavailable");
    }

    let runtime = ConversationRuntime::new(storage, nlu, gate, config.call_timeout);
    let state = AppState::new(runtime, health);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(cors).layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("tablebot listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

/// Open the configured session store.
///
/// A store that fails to open still lets the server start so the health
/// check can report it; every chat turn then fails.
fn open_storage(config: &ServerConfig) -> (Arc<dyn Storage>, bool) {
    let Some(path) = &config.db_path else {
        tracing::info!("No TABLEBOT_DB_PATH set, keeping sessions in memory");
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        return (storage, true);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "Could not create database directory");
        }
    }

    tracing::info!(path = %path.display(), "Opening database");
    match Database::open(path) {
        Ok(db) => {
            let storage: Arc<dyn Storage> = Arc::new(DatabaseStorage::new(db));
            (storage, true)
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Session store unavailable");
            let storage: Arc<dyn Storage> = Arc::new(UnavailableStorage::new(e.to_string()));
            (storage, false)
        }
    }
}
