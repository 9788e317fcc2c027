//! Embedding Provider (C3, spec.md §4.2).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use crate::models::EmbeddingVector;
use crate::utils::error::{PipelineError, PipelineResult};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> PipelineResult<EmbeddingVector>;

    /// Discovered once and cached by callers; exposed so the schema
    /// knowledge base can validate stored vectors share a dimension.
    fn dimension_hint(&self) -> Option<usize> {
        None
    }
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingApiDatum>,
}

#[derive(Deserialize)]
struct EmbeddingApiDatum {
    embedding: Vec<f32>,
}

/// HTTP client for an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbeddingProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl HttpEmbeddingProvider {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, timeout_s: u64) -> Self {
        let timeout = Duration::from_secs(timeout_s);
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: 2,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> PipelineResult<EmbeddingVector> {
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));
        let body = serde_json::json!({ "model": self.model, "input": text });

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!("embedding provider rate limited");
                    return Err(PipelineError::LlmRateLimit);
                }
                Ok(resp) if resp.status().is_client_error() => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    tracing::warn!(%status, "embedding provider rejected request");
                    return Err(PipelineError::EmbeddingUnavailable(format!("{status}: {text}")));
                }
                Ok(resp) if resp.status().is_success() => {
                    let parsed: EmbeddingApiResponse = resp
                        .json()
                        .await
                        .map_err(|e| PipelineError::EmbeddingUnavailable(e.to_string()))?;
                    let vector = parsed
                        .data
                        .into_iter()
                        .next()
                        .map(|d| EmbeddingVector(d.embedding))
                        .ok_or_else(|| PipelineError::EmbeddingUnavailable("empty embedding response".into()))?;
                    return Ok(vector);
                }
                Ok(resp) => {
                    // Transient server-side error: retry with backoff.
                    let status = resp.status();
                    if attempt >= self.max_retries {
                        return Err(PipelineError::EmbeddingUnavailable(format!("status {status}")));
                    }
                }
                Err(e) if e.is_timeout() => {
                    if attempt >= self.max_retries {
                        return Err(PipelineError::LlmTimeout);
                    }
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(PipelineError::EmbeddingUnavailable(e.to_string()));
                    }
                }
            }

            attempt += 1;
            sleep(backoff(attempt)).await;
        }
    }

    fn dimension_hint(&self) -> Option<usize> {
        None
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(100u64.saturating_mul(1u64 << attempt.min(4)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially() {
        assert!(backoff(1) < backoff(2));
        assert!(backoff(2) < backoff(3));
    }
}
