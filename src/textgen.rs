use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::{config::AppConfig, models::DescriptionBrief};

const MAX_DRAFT_TOKENS: u32 = 400;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TextGenError {
    #[error("text generation is not configured")]
    NotConfigured,

    #[error("text generation request failed: {0}")]
    Request(String),

    #[error("text generation returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("text generation returned no content")]
    EmptyCompletion,
}

/// TextGenerator
///
/// Opaque text-completion capability used by the description assistant. One call per
/// request; failures are reported, never retried.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, TextGenError>;
}

pub type TextGenState = Arc<dyn TextGenerator>;

/// Picks the HTTP client when an API key is configured, otherwise a generator that
/// always reports `NotConfigured`.
pub fn from_config(config: &AppConfig) -> TextGenState {
    match &config.textgen_key {
        Some(key) => Arc::new(HttpTextGenerator::new(
            &config.textgen_url,
            key,
            &config.textgen_model,
        )),
        None => {
            tracing::warn!("TEXTGEN_API_KEY not set; description drafts are disabled");
            Arc::new(UnconfiguredTextGenerator)
        }
    }
}

/// Prompt sent for an internship description draft.
pub fn build_prompt(brief: &DescriptionBrief) -> String {
    let mut prompt = format!(
        "Write a concise, professional internship description for a {} internship in {}.",
        brief.position, brief.category
    );
    if !brief.skills.is_empty() {
        prompt.push_str(&format!(" Required skills: {}.", brief.skills.join(", ")));
    }
    if let Some(duration) = &brief.duration {
        prompt.push_str(&format!(" Duration: {duration}."));
    }
    prompt.push_str(" Cover responsibilities, learning outcomes and who should apply.");
    prompt
}

// --- OpenAI-compatible chat completions ---

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl HttpTextGenerator {
    pub fn new(url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, TextGenError> {
        let request = ChatRequest {
            model: &self.model,
            max_tokens: MAX_DRAFT_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TextGenError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TextGenError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TextGenError::Request(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(TextGenError::EmptyCompletion)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTextGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredTextGenerator {
    async fn complete(&self, _prompt: &str) -> Result<String, TextGenError> {
        Err(TextGenError::NotConfigured)
    }
}

/// MockTextGenerator
///
/// Test double that echoes a canned reply and records every prompt it received.
#[derive(Debug, Default)]
pub struct MockTextGenerator {
    pub reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, TextGenError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply
            .clone()
            .ok_or_else(|| TextGenError::Request("simulated provider outage".to_string()))
    }
}
