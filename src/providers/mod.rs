pub mod embedding;
pub mod llm;

pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use llm::{HttpLlmProvider, LlmProvider};
