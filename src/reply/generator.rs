use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ReplyConfig;
use crate::error::{BridgeError, BridgeResult};

/// Produces reply text from the caller's transcript so far
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, prior_text: &str) -> BridgeResult<String>;
}

/// Always answers with the same phrase (used when no completion API is configured)
#[derive(Debug, Clone)]
pub struct CannedReply {
    text: String,
}

impl CannedReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ReplyGenerator for CannedReply {
    async fn generate(&self, _prior_text: &str) -> BridgeResult<String> {
        Ok(self.text.clone())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client
#[derive(Debug, Clone)]
pub struct ChatCompletionsGenerator {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &ReplyConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to create chat completions client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into().trim().to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl ReplyGenerator for ChatCompletionsGenerator {
    async fn generate(&self, prior_text: &str) -> BridgeResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prior_text,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Collaborator(format!(
                "chat completions returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        debug!("Chat completion returned {} chars", content.len());
        Ok(content)
    }
}

/// Pick the generator for this configuration
pub fn generator_from_config(config: &ReplyConfig) -> Result<Arc<dyn ReplyGenerator>> {
    match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            info!("Reply generation via {} ({})", config.api_base, config.model);
            Ok(Arc::new(ChatCompletionsGenerator::new(config, key)?))
        }
        _ => {
            info!("No completion API key configured; replies use the fallback phrase");
            Ok(Arc::new(CannedReply::new(config.fallback.clone())))
        }
    }
}

/// Last `max_chars` characters of `text`, cut on a char boundary
pub fn trailing_window(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    let skip = total - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
