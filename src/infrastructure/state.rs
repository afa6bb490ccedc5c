//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::outbound::{CharacterStorePort, LlmPort};
use crate::application::services::{CreatorRegistry, SessionConfig, SessionRegistry};
use crate::infrastructure::config::{AppConfig, ConfigError};
use crate::infrastructure::llm::build_provider;
use crate::infrastructure::persistence::MarkdownStore;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub llm: Arc<dyn LlmPort>,
    pub store: Arc<dyn CharacterStorePort>,
    /// Active game sessions by conversation id.
    pub sessions: SessionRegistry,
    /// In-flight character creations by conversation id.
    pub creators: CreatorRegistry,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let llm = build_provider(&config)?;
        let store: Arc<dyn CharacterStorePort> =
            Arc::new(MarkdownStore::new(config.data_path.clone()));

        Ok(Self {
            config,
            llm,
            store,
            sessions: SessionRegistry::new(),
            creators: CreatorRegistry::new(),
        })
    }

    /// Session settings derived from the configuration, for transports
    /// constructing new sessions.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            inactivity_timeout: Duration::from_secs(self.config.session_timeout_minutes * 60),
            ..SessionConfig::default()
        }
    }
}
