//! Turn input/output value objects exchanged with the transport layer

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a piece of game text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Player,
    Gm,
    System,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Player => "player",
            InputSource::Gm => "gm",
            InputSource::System => "system",
        }
    }
}

impl std::fmt::Display for InputSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of player (or system) input fed into a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInput {
    pub source: InputSource,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

impl GameInput {
    pub fn player(content: impl Into<String>) -> Self {
        Self {
            source: InputSource::Player,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The game master's reply for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOutput {
    pub source: InputSource,
    pub content: String,
    pub is_action: bool,
    pub timestamp: DateTime<Utc>,
}

impl GameOutput {
    pub fn gm(content: impl Into<String>) -> Self {
        Self {
            source: InputSource::Gm,
            content: content.into(),
            is_action: false,
            timestamp: Utc::now(),
        }
    }
}
