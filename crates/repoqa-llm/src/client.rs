//! Minimal OpenAI-compatible `/chat/completions` client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use repoqa_core::config::LlmSettings;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key not configured (set llm.api_key or APP_LLM__API_KEY)")]
    MissingApiKey,
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
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

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let api_key = Some(settings.api_key.trim().to_string()).filter(|k| !k.is_empty());
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One non-streaming completion: system prompt, optional context
    /// message, then the user message.
    pub async fn complete(&self, system: &str, context: Option<&str>, user: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatRequest { model: &self.model, messages: build_messages(system, context, user) };

        debug!(model = %self.model, messages = request.messages.len(), "chat completion request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Network(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
            return Err(LlmError::Api { status: status.as_u16(), message });
        }
        parse_completion(&body)
    }
}

pub(crate) fn build_messages(system: &str, context: Option<&str>, user: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage { role: "system", content: system.to_string() }];
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        messages.push(ChatMessage { role: "user", content: context.to_string() });
    }
    messages.push(ChatMessage { role: "user", content: user.to_string() });
    messages
}

pub(crate) fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        let snippet: String = body.chars().take(500).collect();
        LlmError::Parse(format!("{e}. Body: {snippet}"))
    })?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| LlmError::Parse("response contained no completion text".to_string()))
}
