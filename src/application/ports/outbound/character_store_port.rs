//! Character store port - Interface for markdown persistence
//!
//! The canonical persisted copy of every character lives behind this port;
//! the filesystem layout and raw read/write primitives are the concrete
//! store's concern.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::entities::Character;
use crate::domain::value_objects::{ChatId, PlayerId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Port for reading and writing character records and related campaign
/// artifacts.
#[async_trait]
pub trait CharacterStorePort: Send + Sync {
    /// Load a character card for a player from a stored markdown file.
    async fn load_character(
        &self,
        player_id: &PlayerId,
        card_name: &str,
    ) -> Result<Character, StoreError>;

    /// Persist a character's current sheet back to its card file.
    async fn save_character(&self, character: &Character) -> Result<(), StoreError>;

    /// Persist a completed creation record, returning the card path.
    async fn save_final_sheet(&self, name: &str, markdown: &str) -> Result<PathBuf, StoreError>;

    /// Append one creation-workflow audit step. Append-only; never read back
    /// by the engine.
    async fn append_creation_step(
        &self,
        character_name: &str,
        step: &str,
        content: &str,
    ) -> Result<(), StoreError>;

    /// Load the scenario text of a campaign, if one is stored.
    async fn load_campaign_scenario(&self, campaign: &str) -> Result<Option<String>, StoreError>;

    /// Append one line to a conversation's play history log.
    async fn append_history(&self, chat_id: ChatId, entry: &str) -> Result<(), StoreError>;
}
