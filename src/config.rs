use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Reads and parses an environment variable, returning `None` if it is
/// unset or fails to parse (an override that can't be understood is
/// treated the same as no override).
fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout_s: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model_correct: String,
    pub model_sql: String,
    pub timeout_s: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub row_cap: usize,
    pub statement_timeout_s: u64,
    pub pipeline_budget_s: u64,
    pub rag_top_k: usize,
    pub rag_min_similarity: f32,
    pub default_season_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Config {
    /// Load configuration with environment variable override support.
    ///
    /// Loading order:
    /// 1. Load from config.toml file, if present
    /// 2. Override with environment variables
    /// 3. Validate the final configuration
    pub fn load() -> Result<Self, anyhow::Error> {
        let mut config = if let Some(config_path) = Self::find_config_file() {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("configuration file not found, using defaults and environment only");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported environment variables: `DATABASE_URL`, `EMBEDDING_API_BASE`,
    /// `EMBEDDING_API_KEY`, `EMBEDDING_MODEL`, `EMBEDDING_TIMEOUT_S`,
    /// `LLM_API_BASE`, `LLM_API_KEY`, `LLM_MODEL_CORRECT`, `LLM_MODEL_SQL`,
    /// `LLM_TIMEOUT_S`, `LLM_MAX_RETRIES`, `ROW_CAP`, `STATEMENT_TIMEOUT_S`,
    /// `PIPELINE_BUDGET_S`, `RAG_TOP_K`, `RAG_MIN_SIMILARITY`,
    /// `DEFAULT_SEASON_CODE`, `LOG_LEVEL`.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
            tracing::info!("override database.url from env");
        }

        if let Ok(v) = std::env::var("EMBEDDING_API_BASE") {
            self.embedding.api_base = v;
        }
        if let Ok(v) = std::env::var("EMBEDDING_API_KEY") {
            self.embedding.api_key = v;
            tracing::info!("override embedding.api_key from env");
        }
        if let Ok(v) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = env_parsed("EMBEDDING_TIMEOUT_S") {
            self.embedding.timeout_s = v;
        }

        if let Ok(v) = std::env::var("LLM_API_BASE") {
            self.llm.api_base = v;
        }
        if let Ok(v) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = v;
            tracing::info!("override llm.api_key from env");
        }
        if let Ok(v) = std::env::var("LLM_MODEL_CORRECT") {
            self.llm.model_correct = v;
        }
        if let Ok(v) = std::env::var("LLM_MODEL_SQL") {
            self.llm.model_sql = v;
        }
        if let Some(v) = env_parsed("LLM_TIMEOUT_S") {
            self.llm.timeout_s = v;
        }
        if let Some(v) = env_parsed("LLM_MAX_RETRIES") {
            self.llm.max_retries = v;
        }

        if let Some(v) = env_parsed("ROW_CAP") {
            self.limits.row_cap = v;
        }
        if let Some(v) = env_parsed("STATEMENT_TIMEOUT_S") {
            self.limits.statement_timeout_s = v;
        }
        if let Some(v) = env_parsed("PIPELINE_BUDGET_S") {
            self.limits.pipeline_budget_s = v;
        }
        if let Some(v) = env_parsed("RAG_TOP_K") {
            self.limits.rag_top_k = v;
        }
        if let Some(v) = env_parsed("RAG_MIN_SIMILARITY") {
            self.limits.rag_min_similarity = v;
        }
        if let Ok(v) = std::env::var("DEFAULT_SEASON_CODE") {
            self.limits.default_season_code = v;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("override logging.level from env: {}", self.logging.level);
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database.url.is_empty() {
            anyhow::bail!("database URL cannot be empty");
        }
        if self.limits.row_cap == 0 {
            anyhow::bail!("limits.row_cap must be > 0");
        }
        if self.limits.statement_timeout_s == 0 {
            anyhow::bail!("limits.statement_timeout_s must be > 0");
        }
        if self.limits.pipeline_budget_s == 0 {
            anyhow::bail!("limits.pipeline_budget_s must be > 0");
        }
        if !(0.0..=1.0).contains(&self.limits.rag_min_similarity) {
            anyhow::bail!("limits.rag_min_similarity must be within [0.0, 1.0]");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: String::new() }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            timeout_s: 10,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model_correct: "gpt-4o-mini".to_string(),
            model_sql: "gpt-4o-mini".to_string(),
            timeout_s: 20,
            max_retries: 2,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            row_cap: 1000,
            statement_timeout_s: 5,
            pipeline_budget_s: 30,
            rag_top_k: 10,
            rag_min_similarity: 0.3,
            default_season_code: "E2025".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,ask_hoops=debug".to_string(), file: Some("logs/ask-hoops.log".to_string()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.row_cap, 1000);
        assert_eq!(limits.statement_timeout_s, 5);
        assert_eq!(limits.pipeline_budget_s, 30);
        assert_eq!(limits.rag_top_k, 10);
        assert_eq!(limits.default_season_code, "E2025");
    }

    #[test]
    fn rejects_empty_database_url() {
        let config = Config { database: DatabaseConfig { url: String::new() }, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_similarity_threshold() {
        let mut config = Config::default();
        config.database.url = "postgres://localhost/db".to_string();
        config.limits.rag_min_similarity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_a_well_formed_config() {
        let mut config = Config::default();
        config.database.url = "postgres://localhost/db".to_string();
        assert!(config.validate().is_ok());
    }
}
