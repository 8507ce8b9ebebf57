//! Model service client
//!
//! Speaks the OpenRouter chat-completions wire format. The conversation is
//! an explicitly owned value: every completion sends the full message list
//! and appends the assistant turn to it, so a caller can keep a correction
//! exchange going without any shared mutable state.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_COMPLETION_TOKENS: u32 = 16384;

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_SECS: u64 = 2;

/// One role-tagged message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// An ordered, owned message history for one exchange with the model.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.push("system", content);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push("user", content);
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push("assistant", content);
    }

    fn push(&mut self, role: &str, content: impl Into<String>) {
        self.messages.push(Message {
            role: role.to_string(),
            content: content.into(),
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Seam between the repair loop and the model service, so the loop can be
/// exercised with fakes.
#[allow(async_fn_in_trait)]
pub trait ModelBackend {
    /// Send the conversation, append the assistant reply to it, and return
    /// the reply text.
    async fn complete(&self, conversation: &mut Conversation) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// HTTP client for the model service.
#[derive(Debug, Clone)]
pub struct ModelClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl ModelClient {
    /// Build a client from the loaded config. Fails when no API key is
    /// configured anywhere.
    pub fn from_config(config: &Config, model: String) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            anyhow!(
                "No API key configured. Set OPENROUTER_API_KEY or add \"api_key\" to {}.",
                Config::config_location()
            )
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            url: config.api_base_url(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ModelBackend for ModelClient {
    async fn complete(&self, conversation: &mut Conversation) -> Result<String> {
        // Owned copy, so the assistant turn can be appended on success.
        let messages = conversation.messages().to_vec();
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            max_tokens: MAX_COMPLETION_TOKENS,
            stream: false,
        };

        let mut retry_count = 0;
        loop {
            let response = self
                .http
                .post(&self.url)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await
                .context("model request failed")?;

            let status = response.status();
            let text = response.text().await.context("model response unreadable")?;

            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
                    anyhow!("failed to parse model service response: {e}\n{text}")
                })?;
                let content = parsed
                    .choices
                    .first()
                    .map(|c| c.message.content.clone())
                    .unwrap_or_default();
                conversation.push_assistant(content.clone());
                return Ok(content);
            }

            if status.as_u16() == 429 && retry_count < MAX_RETRIES {
                retry_count += 1;
                let backoff = INITIAL_BACKOFF_SECS << (retry_count - 1);
                eprintln!(
                    "  Model service rate limited. Retrying in {backoff}s (attempt {retry_count}/{MAX_RETRIES})"
                );
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                continue;
            }

            let message = match status.as_u16() {
                401 => "Invalid API key for the model service.".to_string(),
                429 => format!(
                    "Rate limited by the model service after {retry_count} retries. Try again in a few minutes."
                ),
                500..=599 => format!(
                    "Model service error ({status}). The service may be temporarily unavailable."
                ),
                _ => format!("API error {}: {}", status, truncate_str(&text, 200)),
            };
            return Err(anyhow!("{message}"));
        }
    }
}

/// Truncate a string for display (Unicode-safe).
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
