//! `ResultEnvelope`, the pipeline's single wire-format output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visualization {
    Bar,
    Line,
    Table,
}

/// Always serializes all five keys (with explicit `null`s) so the caller
/// has a single parsing path regardless of which branch of the pipeline
/// produced the envelope.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResultEnvelope {
    pub sql: Option<String>,
    pub data: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    pub visualization: Option<Visualization>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ResultEnvelope {
    pub fn success(
        sql: Option<String>,
        data: Vec<serde_json::Map<String, serde_json::Value>>,
        visualization: Visualization,
    ) -> Self {
        Self { sql, data: Some(data), visualization: Some(visualization), error: None, message: None }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { sql: None, data: None, visualization: None, error: Some(code.into()), message: Some(message.into()) }
    }

    /// Error envelope that still names the SQL that was attempted, so the
    /// caller can see what ran when the failure happened during execution.
    pub fn error_with_sql(code: impl Into<String>, message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            sql: Some(sql.into()),
            data: None,
            visualization: None,
            error: Some(code.into()),
            message: Some(message.into()),
        }
    }

    /// An unsupported-query response that carries a human message alongside
    /// an error, the one case where both are set at once.
    pub fn unsupported_with_message(message: impl Into<String>) -> Self {
        Self {
            sql: None,
            data: None,
            visualization: None,
            error: Some("UNSUPPORTED_QUERY".to_string()),
            message: Some(message.into()),
        }
    }
}
