//! Owning registries for per-conversation sessions and creators
//!
//! Both registries are keyed by chat id and follow single-writer mutation
//! discipline: the map lock is held only for the lookup, never across a
//! turn, so conversations stay fully parallel while each conversation's
//! work is serialized by its own session/creator lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::application::services::creator::{CharacterCreator, StepOutcome};
use crate::application::services::session::{GameSession, SessionError};
use crate::domain::value_objects::{ChatId, GameInput, GameOutput, PlayerId};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no active session for chat {0}")]
    NoSession(ChatId),
    #[error("no character creation in progress for chat {0}")]
    NoCreator(ChatId),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Concurrent map from conversation id to its game session.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ChatId, Arc<GameSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, chat_id: ChatId, session: Arc<GameSession>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(chat_id, session);
        tracing::info!(chat = %chat_id, "session registered");
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<Arc<GameSession>> {
        self.sessions.read().await.get(&chat_id).cloned()
    }

    pub async fn remove(&self, chat_id: ChatId) -> Option<Arc<GameSession>> {
        let removed = self.sessions.write().await.remove(&chat_id);
        if removed.is_some() {
            tracing::info!(chat = %chat_id, "session removed");
        }
        removed
    }

    pub async fn all(&self) -> Vec<Arc<GameSession>> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Route one player message into the conversation's session.
    pub async fn process_player_message(
        &self,
        chat_id: ChatId,
        player_id: &PlayerId,
        text: &str,
    ) -> Result<GameOutput, RegistryError> {
        let session = self
            .get(chat_id)
            .await
            .ok_or(RegistryError::NoSession(chat_id))?;

        let input = GameInput::player(text).with_metadata("player_id", player_id.as_str());

        let output = session.process_input(input).await.map_err(|e| {
            tracing::warn!(chat = %chat_id, error = %e, "failed to process player message");
            e
        })?;

        Ok(output)
    }

    /// Stop and drop every registered session.
    pub async fn shutdown(&self) {
        let sessions: Vec<_> = {
            let mut map = self.sessions.write().await;
            map.drain().map(|(_, s)| s).collect()
        };
        for session in sessions {
            session.stop().await;
        }
    }
}

/// Reply from the creator registry: the step outcome plus lifecycle flags
/// the transport needs for cleanup.
#[derive(Debug, Clone)]
pub struct CreatorReply {
    pub outcome: StepOutcome,
    pub complete: bool,
    pub cancelled: bool,
}

/// Concurrent map from conversation id to its character-creation workflow.
///
/// Each creator sits behind its own lock; creation input for one chat is
/// serialized while different chats proceed in parallel.
#[derive(Default)]
pub struct CreatorRegistry {
    creators: RwLock<HashMap<ChatId, Arc<Mutex<CharacterCreator>>>>,
}

impl CreatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a creation workflow for a conversation, returning the first
    /// step's prompt. An existing workflow for the chat is replaced.
    pub async fn begin(&self, chat_id: ChatId, creator: CharacterCreator) -> String {
        let prompt = creator.prompt();
        let mut creators = self.creators.write().await;
        if creators
            .insert(chat_id, Arc::new(Mutex::new(creator)))
            .is_some()
        {
            tracing::info!(chat = %chat_id, "restarted character creation");
        } else {
            tracing::info!(chat = %chat_id, "started character creation");
        }
        prompt
    }

    pub async fn contains(&self, chat_id: ChatId) -> bool {
        self.creators.read().await.contains_key(&chat_id)
    }

    /// Feed input into the conversation's creation workflow. A cancelled
    /// workflow is dropped from the registry.
    pub async fn process(&self, chat_id: ChatId, text: &str) -> Result<CreatorReply, RegistryError> {
        let creator = self
            .creators
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .ok_or(RegistryError::NoCreator(chat_id))?;

        let mut creator = creator.lock().await;
        let outcome = creator.process_input(text).await;
        let reply = CreatorReply {
            outcome,
            complete: creator.is_complete(),
            cancelled: creator.is_cancelled(),
        };
        drop(creator);

        if reply.cancelled {
            self.creators.write().await.remove(&chat_id);
            tracing::info!(chat = %chat_id, "character creation cancelled");
        }

        Ok(reply)
    }

    /// Remove and return the conversation's workflow, e.g. to persist a
    /// completed character.
    pub async fn take(&self, chat_id: ChatId) -> Option<Arc<Mutex<CharacterCreator>>> {
        self.creators.write().await.remove(&chat_id)
    }
}
