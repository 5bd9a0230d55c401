use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::prompt::batch_response_schema;
use crate::core::config::{ConfigError, ExtractionConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Prior turns with the extraction service for one chat session.
///
/// Only the latest `max_turns` prompt/reply pairs are kept; each prompt
/// carries a full page body, so an unbounded history would outgrow any
/// context window within a few batches.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    max_turns: usize,
}

impl Conversation {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn turns(&self) -> usize {
        self.messages.len() / 2
    }

    /// Records a completed exchange.
    pub fn push_turn(&mut self, prompt: String, reply: String) {
        self.messages.push(ChatMessage::user(prompt));
        self.messages.push(ChatMessage::assistant(reply));

        let excess = self.turns().saturating_sub(self.max_turns);
        if excess > 0 {
            self.messages.drain(..excess * 2);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// A conversational generative-text service that turns an instruction into a
/// text reply. Implementations record the exchange in `conversation` only on
/// success.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn send_message(&self, conversation: &mut Conversation, prompt: String)
        -> Result<String>;

    /// Whether replies are schema-constrained (`{"resorts": [...]}`).
    fn structured_output(&self) -> bool {
        false
    }
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiCompatClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    structured_output: bool,
}

impl std::fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("structured_output", &self.structured_output)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build extraction HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl OpenAiCompatClient {
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ClientBuildError> {
        let api_key = config.resolve_api_key()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.resolve_request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            endpoint: chat_completions_url(&config.resolve_base_url()),
            api_key,
            model: config.resolve_model(),
            structured_output: config.resolve_structured_output(),
        })
    }

    fn request_body(&self, conversation: &Conversation, prompt: &str) -> serde_json::Value {
        let mut messages: Vec<serde_json::Value> = conversation
            .messages()
            .iter()
            .map(|m| serde_json::json!({ "role": m.role, "content": m.content }))
            .collect();
        messages.push(serde_json::json!({ "role": "user", "content": prompt }));

        let mut body = serde_json::json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": messages,
        });

        if self.structured_output {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "resort_batch",
                    "schema": batch_response_schema(),
                }
            });
        }

        body
    }
}

#[async_trait]
impl ExtractionService for OpenAiCompatClient {
    async fn send_message(
        &self,
        conversation: &mut Conversation,
        prompt: String,
    ) -> Result<String> {
        info!(
            "Sending extraction turn to {} (model {}, {} prior turns, {} prompt chars)",
            self.endpoint,
            self.model,
            conversation.turns(),
            prompt.len()
        );

        let body = self.request_body(conversation, &prompt);
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat.completions request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("Extraction service answered {}", status);
            return Err(anyhow::anyhow!(
                "chat.completions failed: status={} body={}",
                status,
                text
            ));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .context("chat.completions response json parse failed")?;

        let content = reply_text(&value)
            .ok_or_else(|| anyhow::anyhow!("chat.completions response had no message content"))?;

        conversation.push_turn(prompt, content.clone());
        Ok(content)
    }

    fn structured_output(&self) -> bool {
        self.structured_output
    }
}

fn chat_completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn reply_text(value: &serde_json::Value) -> Option<String> {
    value
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}
