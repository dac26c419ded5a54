//! Prompt-drafting LLM client (OpenAI-compatible chat completions).
//!
//! The request carries the configured model, temperature, and token limit;
//! the user message asks for a single image-generation prompt refined from a
//! vocabulary entry's definition and part-of-speech. The response text is
//! `choices[0].message.content`, trimmed.
//!
//! The API key is read from the `LEXIFORGE_API_KEY` environment variable at
//! construction time; secrets never live in config files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use lexiforge_core::{LlmConfig, PipelineError, PipelineResult, PromptGenerator, VocabEntry};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "LEXIFORGE_API_KEY";

const SYSTEM_PROMPT: &str = "You write prompts for a text-to-image model. \
    Given a word definition and its part of speech, reply with one vivid, \
    concrete scene description that depicts the meaning. Reply with the \
    prompt only, no commentary.";

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// OpenAI-compatible chat-completions client implementing [`PromptGenerator`].
pub struct LlmPromptClient {
    client: Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl LlmPromptClient {
    /// Build a client with the configured per-call timeout.
    pub fn new(config: &LlmConfig) -> PipelineResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::generation("llm", e.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        })
    }

    /// The user-role message for one vocabulary entry.
    fn user_message(entry: &VocabEntry) -> String {
        format!(
            "Definition: {definition}\nPart of speech: {pos}",
            definition = entry.definition,
            pos = entry.pos
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Extract the drafted prompt from a parsed response.
    fn extract_prompt(response: ChatResponse) -> PipelineResult<String> {
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::generation("llm", "response has no choices"))?;
        let prompt = content.trim().to_string();
        if prompt.is_empty() {
            return Err(PipelineError::generation("llm", "empty prompt in response"));
        }
        Ok(prompt)
    }
}

#[async_trait]
impl PromptGenerator for LlmPromptClient {
    async fn generate(&self, entry: &VocabEntry) -> PipelineResult<String> {
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::user_message(entry)},
            ],
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::generation("llm", e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::generation(
                "llm",
                format!("HTTP {status}: {detail}"),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::generation("llm", e.to_string()))?;
        let prompt = Self::extract_prompt(parsed)?;
        tracing::debug!(word = %entry.word, "prompt drafted");
        Ok(prompt)
    }
}
