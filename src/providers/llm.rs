//! LLM Provider (C4, spec.md §4.3).
//!
//! Two operations, both text-in/text-out, sharing one transport and
//! differing only in which model/parameter set is used: `correct` for
//! the input normalizer (C6) at a moderate sampling temperature, and
//! `synthesize_sql` for the SQL synthesizer (C8) at a low one.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::utils::error::{PipelineError, PipelineResult};

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn correct(&self, user_text: &str) -> PipelineResult<String>;
    async fn synthesize_sql(&self, prompt: &str) -> PipelineResult<String>;
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct HttpLlmProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model_correct: String,
    model_sql: String,
    max_retries: u32,
}

impl HttpLlmProvider {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model_correct: impl Into<String>,
        model_sql: impl Into<String>,
        timeout_s: u64,
        max_retries: u32,
    ) -> Self {
        Self {
            client: Client::builder().timeout(Duration::from_secs(timeout_s)).build().unwrap_or_default(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            model_correct: model_correct.into(),
            model_sql: model_sql.into(),
            max_retries,
        }
    }

    async fn chat(&self, model: &str, system_prompt: &str, user_text: &str, temperature: f32) -> PipelineResult<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": model,
            "temperature": temperature,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_text },
            ],
        });

        let mut attempt = 0;
        loop {
            let response = self.client.post(&url).bearer_auth(&self.api_key).json(&body).send().await;

            match response {
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    return Err(PipelineError::LlmRateLimit);
                }
                Ok(resp) if resp.status().is_client_error() => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(PipelineError::LlmUnavailable(format!("{status}: {text}")));
                }
                Ok(resp) if resp.status().is_success() => {
                    let parsed: ChatCompletionResponse = resp
                        .json()
                        .await
                        .map_err(|e| PipelineError::LlmInvalidOutput(e.to_string()))?;
                    let content = parsed
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .ok_or_else(|| PipelineError::LlmInvalidOutput("no choices returned".into()))?;
                    return Ok(content);
                }
                Ok(resp) => {
                    let status = resp.status();
                    if attempt >= self.max_retries {
                        return Err(PipelineError::LlmUnavailable(format!("status {status}")));
                    }
                }
                Err(e) if e.is_timeout() => {
                    if attempt >= self.max_retries {
                        return Err(PipelineError::LlmTimeout);
                    }
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(PipelineError::LlmUnavailable(e.to_string()));
                    }
                }
            }

            attempt += 1;
            sleep(backoff(attempt)).await;
        }
    }
}

const CORRECT_SYSTEM_PROMPT: &str = "Return only the corrected query, preserving intent, \
fixing diacritics and typos in player/team names; if unsure, return input unchanged.";

const SQL_SYSTEM_PROMPT_PREFIX: &str = "You translate basketball statistics questions into SQL.";

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    async fn correct(&self, user_text: &str) -> PipelineResult<String> {
        self.chat(&self.model_correct, CORRECT_SYSTEM_PROMPT, user_text, 0.4).await
    }

    async fn synthesize_sql(&self, prompt: &str) -> PipelineResult<String> {
        self.chat(&self.model_sql, SQL_SYSTEM_PROMPT_PREFIX, prompt, 0.1).await
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(150u64.saturating_mul(1u64 << attempt.min(4)))
}
