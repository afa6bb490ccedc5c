//! Markdown file store for characters, campaigns and play history
//!
//! Layout under the data root:
//!
//! ```text
//! characters/character_<name>.md         completed character records
//! characters/creation/<name>/<NN>.md     creation audit trail
//! campaigns/<campaign>/scenario.md       campaign scenario text
//! history/<chat_id>.md                   play history per conversation
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::ports::outbound::{CharacterStorePort, StoreError};
use crate::domain::entities::{extract_character_name, Character};
use crate::domain::value_objects::{ChatId, PlayerId};

/// Filesystem-backed character store.
pub struct MarkdownStore {
    base_path: PathBuf,
}

impl MarkdownStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn characters_dir(&self) -> PathBuf {
        self.base_path.join("characters")
    }

    fn resolve_card_path(&self, card_name: &str) -> PathBuf {
        let path = Path::new(card_name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.characters_dir().join(format!("{card_name}.md"))
        }
    }

    async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CharacterStorePort for MarkdownStore {
    async fn load_character(
        &self,
        player_id: &PlayerId,
        card_name: &str,
    ) -> Result<Character, StoreError> {
        let path = self.resolve_card_path(card_name);
        let sheet = fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.display().to_string())
            } else {
                StoreError::Io(e)
            }
        })?;

        let name = extract_character_name(&sheet).unwrap_or_else(|| card_name.to_string());
        tracing::info!(player = %player_id, character = %name, path = %path.display(), "character loaded");

        Ok(Character::new(name, path, sheet))
    }

    async fn save_character(&self, character: &Character) -> Result<(), StoreError> {
        Self::ensure_parent(&character.card_path).await?;
        fs::write(&character.card_path, &character.sheet).await?;
        tracing::info!(
            character = %character.name,
            path = %character.card_path.display(),
            "character saved"
        );
        Ok(())
    }

    async fn save_final_sheet(&self, name: &str, markdown: &str) -> Result<PathBuf, StoreError> {
        let path = self.characters_dir().join(format!("character_{name}.md"));
        Self::ensure_parent(&path).await?;
        fs::write(&path, markdown).await?;
        Ok(path)
    }

    async fn append_creation_step(
        &self,
        character_name: &str,
        step: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let path = self
            .characters_dir()
            .join("creation")
            .join(character_name)
            .join(format!("{step}.md"));
        Self::ensure_parent(&path).await?;
        fs::write(&path, content).await?;
        Ok(())
    }

    async fn load_campaign_scenario(&self, campaign: &str) -> Result<Option<String>, StoreError> {
        let path = self
            .base_path
            .join("campaigns")
            .join(campaign)
            .join("scenario.md");
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn append_history(&self, chat_id: ChatId, entry: &str) -> Result<(), StoreError> {
        let path = self.base_path.join("history").join(format!("{chat_id}.md"));
        Self::ensure_parent(&path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let line = format!("[{}] {}\n", Utc::now().format("%H:%M"), entry);
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
