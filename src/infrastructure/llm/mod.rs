//! LLM provider clients

mod openai;

use std::sync::Arc;

pub use openai::OpenAiCompatClient;

use crate::application::ports::outbound::LlmPort;
use crate::infrastructure::config::{AppConfig, ConfigError};

/// Construct the LLM provider selected by the configuration.
///
/// Missing credentials were already rejected by [`AppConfig::from_env`];
/// this keeps the signature fallible for callers assembling a config by
/// hand.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn LlmPort>, ConfigError> {
    let provider = config
        .providers
        .get(&config.default_provider)
        .ok_or_else(|| {
            ConfigError::MissingApiKey(
                config.default_provider.to_uppercase(),
                config.default_provider.clone(),
            )
        })?;

    tracing::info!(
        provider = %provider.name,
        model = %provider.model,
        base_url = %provider.base_url,
        "LLM provider configured"
    );

    Ok(Arc::new(OpenAiCompatClient::new(provider)))
}
