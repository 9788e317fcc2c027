//! Explicit application context (spec.md §9: "global singletons -> explicit
//! context + injectable providers"). Constructed once at startup from
//! [`crate::config::Config`] and passed by reference into the pipeline;
//! nothing here is a global/static.

use std::sync::Arc;

use crate::config::Config;
use crate::db::DataAccessLayer;
use crate::pipeline::schema_kb::SchemaKnowledgeBase;
use crate::providers::{EmbeddingProvider, HttpEmbeddingProvider, HttpLlmProvider, LlmProvider};

pub struct AppContext {
    pub config: Config,
    pub db: DataAccessLayer,
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub llm_provider: Arc<dyn LlmProvider>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let db =
            DataAccessLayer::new(config.database.url.clone(), config.limits.row_cap, config.limits.statement_timeout_s);

        let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(HttpEmbeddingProvider::new(
            config.embedding.api_base.clone(),
            config.embedding.api_key.clone(),
            config.embedding.model.clone(),
            config.embedding.timeout_s,
        ));

        let llm_provider: Arc<dyn LlmProvider> = Arc::new(HttpLlmProvider::new(
            config.llm.api_base.clone(),
            config.llm.api_key.clone(),
            config.llm.model_correct.clone(),
            config.llm.model_sql.clone(),
            config.llm.timeout_s,
            config.llm.max_retries,
        ));

        Self { config, db, embedding_provider, llm_provider }
    }

    /// The embedding-dimension cache and fallback corpus are the only
    /// cross-request shared state (spec.md §5); a fresh
    /// [`SchemaKnowledgeBase`] handle is cheap to build per request since
    /// it only clones an `Arc` and a pool-less [`DataAccessLayer`].
    pub fn schema_kb(&self) -> SchemaKnowledgeBase {
        SchemaKnowledgeBase::new(
            self.db.clone(),
            self.embedding_provider.clone(),
            self.config.limits.rag_top_k,
            self.config.limits.rag_min_similarity,
        )
    }

    pub fn with_providers(
        config: Config,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let db =
            DataAccessLayer::new(config.database.url.clone(), config.limits.row_cap, config.limits.statement_timeout_s);
        Self { config, db, embedding_provider, llm_provider }
    }
}
