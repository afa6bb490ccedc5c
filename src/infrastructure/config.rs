//! Application configuration loaded from environment

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Known provider presets: (name, default base URL, default model).
const PROVIDER_PRESETS: [(&str, &str, &str); 3] = [
    ("openai", "https://api.openai.com/v1", "gpt-4o"),
    ("zai", "https://api.z.ai/v1", "claude-3-5-sonnet-20240228"),
    ("minimax", "https://api.minimax.chat/v1", "minimax-text"),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}_API_KEY environment variable is required for provider {1}")]
    MissingApiKey(String, String),
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Connection settings for one OpenAI-compatible LLM provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the provider used for all sessions.
    pub default_provider: String,
    /// Every provider with credentials present in the environment.
    pub providers: HashMap<String, ProviderConfig>,
    /// Root directory for campaigns, characters and history.
    pub data_path: PathBuf,
    /// Session inactivity timeout, minutes.
    pub session_timeout_minutes: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// The only fatal condition is a missing API key for the selected
    /// provider; other providers are simply absent from the map.
    pub fn from_env() -> Result<Self, ConfigError> {
        let default_provider =
            env::var("DEFAULT_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let mut providers = HashMap::new();
        for (name, default_base_url, default_model) in PROVIDER_PRESETS {
            if let Some(provider) = Self::provider_from_env(name, default_base_url, default_model)
            {
                providers.insert(name.to_string(), provider);
            }
        }

        // A fully custom OpenAI-compatible endpoint.
        if let Some(provider) =
            Self::provider_from_env("custom", "https://api.openai.com/v1", "gpt-4o")
        {
            providers.insert("custom".to_string(), provider);
        }

        let known = PROVIDER_PRESETS.iter().any(|(n, _, _)| *n == default_provider)
            || default_provider == "custom";
        if !known {
            return Err(ConfigError::UnknownProvider(default_provider));
        }

        if !providers.contains_key(&default_provider) {
            return Err(ConfigError::MissingApiKey(
                default_provider.to_uppercase(),
                default_provider,
            ));
        }

        let session_timeout_minutes = match env::var("SESSION_TIMEOUT_MINUTES") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("SESSION_TIMEOUT_MINUTES", raw))?,
            Err(_) => 30,
        };

        Ok(Self {
            default_provider,
            providers,
            data_path: env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            session_timeout_minutes,
        })
    }

    fn provider_from_env(
        name: &str,
        default_base_url: &str,
        default_model: &str,
    ) -> Option<ProviderConfig> {
        let prefix = name.to_uppercase();
        let api_key = env::var(format!("{prefix}_API_KEY")).ok()?;
        Some(ProviderConfig {
            name: name.to_string(),
            api_key,
            base_url: env::var(format!("{prefix}_BASE_URL"))
                .unwrap_or_else(|_| default_base_url.to_string()),
            model: env::var(format!("{prefix}_MODEL"))
                .unwrap_or_else(|_| default_model.to_string()),
        })
    }

    /// The provider configuration selected by `DEFAULT_PROVIDER`.
    pub fn selected_provider(&self) -> &ProviderConfig {
        // from_env guarantees presence.
        &self.providers[&self.default_provider]
    }
}
