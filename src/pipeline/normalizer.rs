//! Input Normalizer (C6, spec.md §4.5).
//!
//! Best-effort, never fatal: any LLM failure or suspicious output (too
//! long, empty) falls back to the original text unchanged.

use std::sync::Arc;

use crate::providers::LlmProvider;

const MAX_LENGTH_MULTIPLIER: usize = 2;

/// Rewrites `user_text` to canonical player/team spellings via the LLM.
/// Returns the input unchanged on any failure or suspicious output.
pub async fn normalize(llm: &Arc<dyn LlmProvider>, user_text: &str) -> String {
    if user_text.trim().is_empty() {
        return user_text.to_string();
    }

    match llm.correct(user_text).await {
        Ok(corrected) => {
            let corrected = corrected.trim();
            if corrected.is_empty() || corrected.len() > user_text.len() * MAX_LENGTH_MULTIPLIER {
                tracing::warn!("normalizer output rejected (empty or runaway length), using raw query");
                user_text.to_string()
            } else {
                corrected.to_string()
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "normalizer LLM call failed, using raw query");
            user_text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{PipelineError, PipelineResult};
    use async_trait::async_trait;

    struct FixedLlmProvider(&'static str);

    #[async_trait]
    impl LlmProvider for FixedLlmProvider {
        async fn correct(&self, _user_text: &str) -> PipelineResult<String> {
            Ok(self.0.to_string())
        }
        async fn synthesize_sql(&self, _prompt: &str) -> PipelineResult<String> {
            unimplemented!()
        }
    }

    struct FailingLlmProvider;

    #[async_trait]
    impl LlmProvider for FailingLlmProvider {
        async fn correct(&self, _user_text: &str) -> PipelineResult<String> {
            Err(PipelineError::LlmTimeout)
        }
        async fn synthesize_sql(&self, _prompt: &str) -> PipelineResult<String> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn returns_corrected_text_on_success() {
        let llm: Arc<dyn LlmProvider> = Arc::new(FixedLlmProvider("Top 10 anotadores de Campazzo"));
        let out = normalize(&llm, "Top 10 anotadores de Campazo").await;
        assert_eq!(out, "Top 10 anotadores de Campazzo");
    }

    #[tokio::test]
    async fn falls_back_to_raw_query_on_llm_failure() {
        let llm: Arc<dyn LlmProvider> = Arc::new(FailingLlmProvider);
        let out = normalize(&llm, "Campazo puntos").await;
        assert_eq!(out, "Campazo puntos");
    }

    #[tokio::test]
    async fn rejects_runaway_rewrite_length() {
        let long = "x".repeat(500);
        let llm: Arc<dyn LlmProvider> = Arc::new(FixedLlmProvider(Box::leak(long.into_boxed_str())));
        let out = normalize(&llm, "short query").await;
        assert_eq!(out, "short query");
    }

    #[tokio::test]
    async fn identity_on_already_canonical_input() {
        let llm: Arc<dyn LlmProvider> = Arc::new(FixedLlmProvider("top 10 scorers Campazzo"));
        let out = normalize(&llm, "top 10 scorers Campazzo").await;
        assert!(out.contains("Campazzo"));
    }
}
