//! repoqa-llm
//!
//! Query expansion and answer synthesis on top of an OpenAI-compatible chat
//! completions endpoint (OpenRouter by default).

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use tracing::debug;

use repoqa_core::config::LlmSettings;
use repoqa_core::traits::{AnswerSynthesizer, QueryRewriter};

pub use client::{ChatClient, LlmError};

/// Rewrites a question into a retrieval-friendly query.
#[derive(Debug, Clone)]
pub struct QueryExpander {
    client: ChatClient,
}

impl QueryExpander {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryRewriter for QueryExpander {
    async fn rewrite(&self, question: &str) -> anyhow::Result<String> {
        let expanded = self.client.complete(prompts::EXPAND_SYSTEM, None, question).await?;
        let expanded = expanded.trim().to_string();
        debug!(%question, %expanded, "expanded query");
        Ok(expanded)
    }
}

/// Answers a question from the contents of the retrieved files.
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: ChatClient,
}

impl Summarizer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnswerSynthesizer for Summarizer {
    async fn synthesize(&self, question: &str, context: &str) -> anyhow::Result<String> {
        Ok(self.client.complete(prompts::SUMMARIZE_SYSTEM, Some(context), question).await?)
    }
}

/// Expander and summarizer sharing one HTTP client.
pub fn from_settings(settings: &LlmSettings) -> Result<(QueryExpander, Summarizer), LlmError> {
    let client = ChatClient::new(settings)?;
    Ok((QueryExpander::new(client.clone()), Summarizer::new(client)))
}
