//! LLM port - Interface to the narrative language model
//!
//! The application only ever sees this trait; the concrete OpenAI-compatible
//! HTTP client lives in the infrastructure layer.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Errors surfaced by an LLM backend during a turn. These are never retried
/// by the core; the caller may retry at a higher layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Port for generating narrative text.
///
/// `character_cards` are the markdown sheets of the characters in play; the
/// implementation prepends them to the prompt as a context block.
#[async_trait]
pub trait LlmPort: Send + Sync {
    /// Generate a single complete response.
    async fn generate(&self, prompt: &str, character_cards: &[String])
        -> Result<String, LlmError>;

    /// Generate a streamed response, delivered chunk by chunk.
    ///
    /// The default implementation degrades to a single-chunk stream backed
    /// by [`LlmPort::generate`], which is sufficient for backends without
    /// server-sent events.
    async fn generate_stream(
        &self,
        prompt: &str,
        character_cards: &[String],
    ) -> Result<mpsc::Receiver<String>, LlmError> {
        let response = self.generate(prompt, character_cards).await?;
        let (tx, rx) = mpsc::channel(1);
        // Receiver is returned before the send; a dropped receiver is fine.
        let _ = tx.send(response).await;
        Ok(rx)
    }
}
