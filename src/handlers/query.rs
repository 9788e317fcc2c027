//! `POST /api/query`. CORS and auth are handled (if at all) by whatever
//! sits in front of this service, so this handler is deliberately thin,
//! with no middleware of its own beyond what `main.rs` installs at the
//! router level.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::context::AppContext;
use crate::models::{ResultEnvelope, Turn};
use crate::pipeline::{CancellationSignal, answer};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Always responds with HTTP 200; failures are carried in the envelope's
/// `error` field so the caller has a single parsing path.
pub async fn post_query(State(ctx): State<Arc<AppContext>>, Json(req): Json<QueryRequest>) -> Json<ResultEnvelope> {
    let trimmed_history = crate::models::trim_history(&req.history, crate::models::DEFAULT_HISTORY_TURNS);
    let envelope = answer(&ctx, &req.query, trimmed_history, CancellationSignal::none()).await;
    Json(envelope)
}
