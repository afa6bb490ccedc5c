//! WFRP GM Engine - service bootstrap
//!
//! Loads configuration, constructs the LLM provider (the only fatal startup
//! path is missing credentials) and holds the session registries until
//! shutdown. Chat transports drive the engine through the library API.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wfrp_engine::infrastructure::config::AppConfig;
use wfrp_engine::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wfrp_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WFRP GM Engine");

    // Load configuration; a missing API key for the selected provider
    // aborts startup here.
    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Provider: {}", config.default_provider);
    tracing::info!("  Data path: {}", config.data_path.display());
    tracing::info!(
        "  Session timeout: {} min",
        config.session_timeout_minutes
    );

    let state = Arc::new(AppState::new(config)?);
    tracing::info!("Application state initialized; waiting for transport connections");

    // Run until interrupted, then stop every live session.
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping sessions...");
    state.sessions.shutdown().await;
    tracing::info!("Sessions stopped");

    Ok(())
}
