//! OpenAI-compatible chat-completions client
//!
//! One client serves every configured provider (OpenAI, z.ai, MiniMax,
//! custom endpoints); they differ only in base URL, model and key.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::application::ports::outbound::{LlmError, LlmPort};
use crate::infrastructure::config::ProviderConfig;

const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f64 = 0.7;

/// Client for an OpenAI-compatible chat-completions API.
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Prepend the character cards as a context block ahead of the prompt.
    fn build_request_text(prompt: &str, character_cards: &[String]) -> String {
        if character_cards.is_empty() {
            return prompt.to_string();
        }

        let mut text = String::from("--- CHARACTER CARDS ---\n");
        for (i, card) in character_cards.iter().enumerate() {
            text.push_str(&format!("Character {}:\n{}\n\n", i + 1, card));
        }
        text.push_str("--- END CHARACTER CARDS ---\n\n");
        text.push_str(prompt);
        text
    }

    fn request_body(&self, prompt: &str, character_cards: &[String], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::build_request_text(prompt, character_cards),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stream,
        }
    }
}

#[async_trait]
impl LlmPort for OpenAiCompatClient {
    async fn generate(
        &self,
        prompt: &str,
        character_cards: &[String],
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, character_cards, false))
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, body)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        character_cards: &[String],
    ) -> Result<mpsc::Receiver<String>, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, character_cards, true))
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, body)));
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let Ok(bytes) = chunk else { break };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // SSE frames are newline-delimited "data: {...}" lines.
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    if let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) {
                        for choice in chunk.choices {
                            if let Some(content) = choice.delta.content {
                                if tx.send(content).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_cards_are_prepended_as_a_context_block() {
        let text = OpenAiCompatClient::build_request_text(
            "Веди игру.",
            &["# Имя: Гюнтер".to_string(), "# Имя: Эльза".to_string()],
        );
        assert!(text.starts_with("--- CHARACTER CARDS ---"));
        assert!(text.contains("Character 1:\n# Имя: Гюнтер"));
        assert!(text.contains("Character 2:\n# Имя: Эльза"));
        assert!(text.ends_with("Веди игру."));
    }

    #[test]
    fn prompt_without_cards_is_unchanged() {
        let text = OpenAiCompatClient::build_request_text("Веди игру.", &[]);
        assert_eq!(text, "Веди игру.");
    }

    #[test]
    fn stream_chunks_deserialize_delta_content() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Привет"}}]}"#).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Привет"));

        let done: StreamChunk = serde_json::from_str(r#"{"choices":[{"delta":{}}]}"#).unwrap();
        assert!(done.choices[0].delta.content.is_none());
    }
}
