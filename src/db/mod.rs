//! Data Access Layer (C2, spec.md §4.1).
//!
//! The connection pool is intentionally disabled on the client side: every
//! [`DataAccessLayer::acquire`] opens a fresh connection and relies on an
//! external connection multiplexer (pgbouncer or equivalent) in front of
//! the database. A client-side pool would accumulate stale handles across
//! a database that can scale its compute to zero between requests.

use serde_json::{Map, Value};
use sqlx::Column;
use sqlx::Row as _;
use sqlx::ConnectOptions;
use sqlx::TypeInfo;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use std::str::FromStr;
use std::time::Duration;

use crate::models::SchemaEmbedding;
use crate::utils::error::{PipelineError, PipelineResult, redact};

/// One connection, scoped to a single request. Released on all exit paths
/// via `Drop` (the underlying `PgConnection` closes its socket on drop).
pub struct Session {
    conn: PgConnection,
    row_cap: usize,
}

/// Rows returned by [`Session::execute`], with truthful truncation
/// signalling (spec §4.1: "the caller is told truthfully, via a flag, not
/// a silent truncation").
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub truncated: bool,
}

#[derive(Clone)]
pub struct DataAccessLayer {
    database_url: String,
    row_cap: usize,
    statement_timeout_s: u64,
}

impl DataAccessLayer {
    pub fn new(database_url: impl Into<String>, row_cap: usize, statement_timeout_s: u64) -> Self {
        Self { database_url: database_url.into(), row_cap, statement_timeout_s }
    }

    /// Opens a fresh, read-only-by-default session: read-only transaction
    /// mode and a statement timeout are set immediately after connect
    /// (spec §4.1 Policy). Retries once after a short backoff on a
    /// connection failure before surfacing `DB_UNREACHABLE`.
    pub async fn acquire(&self) -> PipelineResult<Session> {
        let options = PgConnectOptions::from_str(&self.database_url)
            .map_err(|e| PipelineError::DbUnreachable(redact(&e.to_string())))?
            .disable_statement_logging();

        let conn = match options.clone().connect().await {
            Ok(conn) => conn,
            Err(first_err) => {
                tracing::warn!(error = %redact(&first_err.to_string()), "db connect failed, retrying once");
                tokio::time::sleep(Duration::from_millis(200)).await;
                options
                    .connect()
                    .await
                    .map_err(|e| PipelineError::DbUnreachable(redact(&e.to_string())))?
            }
        };

        let mut session = Session { conn, row_cap: self.row_cap };
        session.set_read_only(self.statement_timeout_s).await?;
        Ok(session)
    }
}

impl Session {
    async fn set_read_only(&mut self, statement_timeout_s: u64) -> PipelineResult<()> {
        sqlx::query("SET default_transaction_read_only = on")
            .execute(&mut self.conn)
            .await
            .map_err(|e| PipelineError::DbUnreachable(redact(&e.to_string())))?;
        sqlx::query(&format!("SET statement_timeout = {}", statement_timeout_s * 1000))
            .execute(&mut self.conn)
            .await
            .map_err(|e| PipelineError::DbUnreachable(redact(&e.to_string())))?;
        Ok(())
    }

    /// Executes `sql` with no bind parameters, returning at most `row_cap`
    /// rows. Timeouts surface as `DB_TIMEOUT`; any other failure surfaces
    /// as `DB_EXEC_ERROR` with the message redacted of connection secrets.
    pub async fn execute(&mut self, sql: &str) -> PipelineResult<Rows> {
        self.execute_params(sql, &[]).await
    }

    /// Executes `sql` with positional text parameters bound as `$1, $2, ...`
    /// (used by the deterministic path, C10, to avoid string-interpolating
    /// user-controlled values into SQL).
    pub async fn execute_params(&mut self, sql: &str, params: &[&str]) -> PipelineResult<Rows> {
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(*p);
        }

        let rows: Vec<PgRow> = match query.fetch_all(&mut self.conn).await {
            Ok(rows) => rows,
            Err(sqlx::Error::PoolTimedOut) => return Err(PipelineError::DbTimeout),
            Err(e) => {
                let msg = e.to_string();
                if msg.to_lowercase().contains("timeout") || msg.to_lowercase().contains("cancel") {
                    return Err(PipelineError::DbTimeout);
                }
                return Err(PipelineError::db_exec_error(msg));
            }
        };

        let columns: Vec<String> =
            rows.first().map(|r| r.columns().iter().map(|c| c.name().to_string()).collect()).unwrap_or_default();

        let truncated = rows.len() > self.row_cap;
        let mut out = Vec::with_capacity(rows.len().min(self.row_cap));
        for row in rows.into_iter().take(self.row_cap) {
            out.push(row_to_json_map(&row));
        }

        Ok(Rows { columns, rows: out, truncated })
    }

    /// Typed read of the full `schema_embeddings` table for the schema
    /// knowledge base (C5). Separate from [`Session::execute`] because
    /// retrieval needs the raw embedding bytes reconstructed into floats,
    /// not the generic JSON row shape the query handler uses.
    pub async fn fetch_schema_embeddings(&mut self) -> PipelineResult<Vec<SchemaEmbedding>> {
        sqlx::query_as::<_, SchemaEmbedding>("SELECT id, content, embedding FROM schema_embeddings ORDER BY id")
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| PipelineError::db_exec_error(redact(&e.to_string())))
    }
}

/// Converts a Postgres row into a JSON object using the column's declared
/// type name, covering the types the schema in spec.md §3 actually uses
/// (text, integers, floats/numerics, booleans, timestamps) plus a string
/// fallback for anything else.
fn row_to_json_map(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let type_name = column.type_info().name().to_uppercase();

        let value = if type_name.contains("INT8") || type_name.contains("BIGINT") {
            row.try_get::<Option<i64>, _>(i).ok().flatten().map(Value::from)
        } else if type_name.contains("INT4") || type_name.contains("INTEGER") || type_name.contains("INT2") {
            row.try_get::<Option<i32>, _>(i).ok().flatten().map(Value::from)
        } else if type_name.contains("FLOAT") || type_name.contains("DOUBLE") || type_name.contains("NUMERIC") {
            row.try_get::<Option<f64>, _>(i)
                .ok()
                .flatten()
                .map(round_to_two_fractional_digits)
                .map(Value::from)
        } else if type_name.contains("BOOL") {
            row.try_get::<Option<bool>, _>(i).ok().flatten().map(Value::from)
        } else {
            row.try_get::<Option<String>, _>(i).ok().flatten().map(Value::from)
        }
        .unwrap_or(Value::Null);

        map.insert(name, value);
    }
    map
}

/// Decimals are serialized to at most two fractional digits (spec §4.10).
fn round_to_two_fractional_digits(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_decimals_to_two_places() {
        assert_eq!(round_to_two_fractional_digits(1.23456), 1.23);
        assert_eq!(round_to_two_fractional_digits(1.0), 1.0);
        assert_eq!(round_to_two_fractional_digits(-0.005), -0.0);
    }
}
