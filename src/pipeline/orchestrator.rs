//! Pipeline Orchestrator (C12, spec.md §4.11).
//!
//! Drives C6 -> C7 -> (C10 or C8) -> C9 -> C2 -> C11, converting any
//! failure into a uniform [`ResultEnvelope`] with `error` populated. Each
//! step is timed and logged as a structured event with `request_id`,
//! `step`, `duration_ms`, and `outcome`.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use uuid::Uuid;

use crate::context::AppContext;
use crate::models::{QueryFamily, ResultEnvelope, Turn};
use crate::utils::error::PipelineError;
use crate::utils::locale::infer_query_locale;

use super::{deterministic, normalizer, router, shaper, synthesizer, validator};

/// Cooperative cancellation signal for [`answer`] (spec.md §5:
/// "the entry point accepts a cancellation signal"). A
/// [`CancellationSignal::none`] never fires, matching the common case of
/// an HTTP handler whose request future is itself dropped on client
/// disconnect without any explicit signalling.
pub struct CancellationSignal(watch::Receiver<bool>);

impl CancellationSignal {
    pub fn none() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self(rx)
    }

    async fn cancelled(&mut self) {
        loop {
            if *self.0.borrow() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Pipeline entry point (spec.md §6): `answer(query, history, cancel_signal)
/// -> ResultEnvelope`. Never panics, never returns an `Err`, every failure
/// is converted into an error envelope. `history` is the last few turns of
/// conversation (already trimmed by the caller, see `models::trim_history`)
/// and is only read by the synthesizer (C8), as context for resolving
/// references like "and his rebounds?" in a follow-up GENERAL_SQL query;
/// the router and deterministic path work from `query` alone.
pub async fn answer(ctx: &AppContext, query: &str, history: &[Turn], mut cancel: CancellationSignal) -> ResultEnvelope {
    let request_id = Uuid::new_v4().to_string();
    infer_query_locale(query);

    let budget = Duration::from_secs(ctx.config.limits.pipeline_budget_s);

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log_step(&request_id, "CANCELLED", Duration::ZERO, "cancelled");
            ResultEnvelope::error(PipelineError::PipelineTimeout.code(), "the request was cancelled")
        }
        _ = tokio::time::sleep(budget) => {
            log_step(&request_id, "BUDGET", budget, "timeout");
            ResultEnvelope::error(
                PipelineError::PipelineTimeout.code(),
                PipelineError::PipelineTimeout.localized_message(),
            )
        }
        envelope = run_pipeline(ctx, &request_id, query, history) => envelope,
    }
}

async fn run_pipeline(ctx: &AppContext, request_id: &str, query: &str, history: &[Turn]) -> ResultEnvelope {
    // NORMALIZED
    let step_start = Instant::now();
    let canonical_query = normalizer::normalize(&ctx.llm_provider, query).await;
    log_step(request_id, "NORMALIZED", step_start.elapsed(), "ok");

    // ROUTED
    let step_start = Instant::now();
    let plan = router::route(&canonical_query, &ctx.config.limits.default_season_code);
    log_step(request_id, "ROUTED", step_start.elapsed(), "ok");

    match plan.family {
        QueryFamily::Unsupported | QueryFamily::GameLevel => {
            log_step(request_id, "DONE", Duration::ZERO, "unsupported");
            ResultEnvelope::unsupported_with_message(
                plan.unsupported_reason.unwrap_or_else(|| "this question cannot be answered with the data available".into()),
            )
        }
        QueryFamily::AggregateStats => {
            let params = plan.aggregate.expect("router always sets aggregate params for AGGREGATE_STATS");

            let step_start = Instant::now();
            let built = deterministic::build(&params);
            log_step(request_id, "DETERMINISTIC", step_start.elapsed(), "ok");

            execute_validated(ctx, request_id, built.sql, built.params, plan.family).await
        }
        QueryFamily::GeneralSql => {
            let step_start = Instant::now();
            let hints = ctx.schema_kb().retrieve(&canonical_query).await;
            log_step(request_id, "RETRIEVED", step_start.elapsed(), "ok");

            let step_start = Instant::now();
            let synthesized =
                synthesizer::synthesize(&ctx.llm_provider, &canonical_query, ctx.config.limits.row_cap, &hints, history)
                    .await;
            match synthesized {
                Ok(sql) => {
                    log_step(request_id, "SYNTHESIZED", step_start.elapsed(), "ok");
                    execute_validated(ctx, request_id, sql, vec![], plan.family).await
                }
                Err(e) => {
                    log_step(request_id, "SYNTHESIZED", step_start.elapsed(), e.code());
                    ResultEnvelope::error(e.code(), e.localized_message())
                }
            }
        }
    }
}

/// Shared VALIDATED -> EXECUTED -> SHAPED tail for both the deterministic
/// and synthesized paths.
async fn execute_validated(
    ctx: &AppContext,
    request_id: &str,
    sql: String,
    params: Vec<String>,
    family: QueryFamily,
) -> ResultEnvelope {
    let step_start = Instant::now();
    let validated_sql = match validator::validate(&sql, ctx.config.limits.row_cap) {
        Ok(sql) => sql,
        Err(e) => {
            log_step(request_id, "VALIDATED", step_start.elapsed(), e.code());
            return ResultEnvelope::error(e.code(), e.localized_message());
        }
    };
    log_step(request_id, "VALIDATED", step_start.elapsed(), "ok");

    let step_start = Instant::now();
    let mut session = match ctx.db.acquire().await {
        Ok(session) => session,
        Err(e) => {
            log_step(request_id, "EXECUTED", step_start.elapsed(), e.code());
            return ResultEnvelope::error_with_sql(e.code(), e.localized_message(), validated_sql);
        }
    };

    let param_refs: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
    let rows = match session.execute_params(&validated_sql, &param_refs).await {
        Ok(rows) => rows,
        Err(e) => {
            log_step(request_id, "EXECUTED", step_start.elapsed(), e.code());
            return ResultEnvelope::error_with_sql(e.code(), e.localized_message(), validated_sql);
        }
    };
    log_step(request_id, "EXECUTED", step_start.elapsed(), "ok");

    let step_start = Instant::now();
    let (visualization, data) = shaper::shape(rows, family);
    log_step(request_id, "SHAPED", step_start.elapsed(), "ok");
    log_step(request_id, "DONE", Duration::ZERO, "ok");

    ResultEnvelope::success(Some(validated_sql), data, visualization)
}

fn log_step(request_id: &str, step: &str, duration: Duration, outcome: &str) {
    tracing::info!(
        request_id = request_id,
        step = step,
        duration_ms = duration.as_millis() as u64,
        outcome = outcome,
        "pipeline step"
    );
}
