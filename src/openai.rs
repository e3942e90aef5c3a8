//! Chat completion client used for changelog summaries
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::changelog::Summarizer;
use crate::error::{ReleaseError, Result};
use crate::prompt::{DEFAULT_MAX_PROMPT_SIZE, SYSTEM_INSTRUCTION, build_summary_prompt};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
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

/// OpenAI-compatible chat completion client
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client for `base_url` (for example `https://api.openai.com/v1`)
    pub fn new(http: reqwest::Client, api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Full URL of the completions endpoint
    pub fn endpoint(&self) -> String {
        completions_url(&self.base_url)
    }

    /// Send one completion request and return the first choice's text
    ///
    /// # Errors
    ///
    /// * Transport failure, non-success status or an unexpected response
    ///   body, all reported as `ReleaseError::Summary`
    pub async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let url = self.endpoint();
        debug!(%url, model = %self.model, "Sending chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReleaseError::Summary(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReleaseError::Summary(format!(
                "Completion endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReleaseError::Summary(format!("Malformed completion response: {}", e)))?;

        parse_completion(parsed)
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    async fn summarize(&self, bullets: &str) -> Result<String> {
        let prompt = build_summary_prompt(bullets, DEFAULT_MAX_PROMPT_SIZE)?;
        self.complete(SYSTEM_INSTRUCTION, &prompt).await
    }
}

fn parse_completion(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ReleaseError::Summary("Completion response had no content".to_string()))
}

/// Join a base URL and the completions path without doubling slashes
pub fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}
