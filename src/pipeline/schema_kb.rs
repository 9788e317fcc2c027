//! Schema Knowledge Base (C5, spec.md §4.4).
//!
//! Two operations: [`SchemaKnowledgeBase::retrieve`] (embedding nearest-
//! neighbor search) and [`SchemaKnowledgeBase::fallback`] (hard-coded
//! corpus). The fallback is authoritative for AGGREGATE_STATS and an
//! enhancement for GENERAL_SQL (spec.md §9, Open Questions).

use std::sync::Arc;

use crate::db::DataAccessLayer;
use crate::models::EmbeddingVector;
use crate::providers::EmbeddingProvider;

/// A retrieved or fallback schema hint, ready to drop into a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHint {
    pub content: String,
    pub similarity: Option<f32>,
}

pub struct SchemaKnowledgeBase {
    db: DataAccessLayer,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    min_similarity: f32,
}

impl SchemaKnowledgeBase {
    pub fn new(
        db: DataAccessLayer,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        min_similarity: f32,
    ) -> Self {
        Self { db, embedding_provider, top_k, min_similarity }
    }

    /// Returns up to `top_k` schema hints above `min_similarity`, ordered by
    /// descending similarity (ties broken by ascending row id). Falls back
    /// to the hard-coded corpus whenever the embedding provider is
    /// unavailable, the table is empty, or nothing clears the threshold.
    pub async fn retrieve(&self, query_text: &str) -> Vec<SchemaHint> {
        let query_embedding = match self.embedding_provider.embed(query_text).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "embedding provider unavailable, using fallback corpus");
                return self.fallback();
            }
        };

        let mut session = match self.db.acquire().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "db unreachable during retrieval, using fallback corpus");
                return self.fallback();
            }
        };

        let rows = match session.fetch_schema_embeddings().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "schema_embeddings read failed, using fallback corpus");
                return self.fallback();
            }
        };

        if rows.is_empty() {
            tracing::info!("schema_embeddings table empty, using fallback corpus");
            return self.fallback();
        }

        let mut scored: Vec<(i64, String, f32)> = rows
            .into_iter()
            .map(|row| {
                let similarity = query_embedding.cosine_similarity(&row.embedding);
                (row.id, row.content, similarity)
            })
            .filter(|(_, _, similarity)| *similarity >= self.min_similarity)
            .collect();

        if scored.is_empty() {
            tracing::info!("no schema_embeddings row cleared similarity threshold, using fallback corpus");
            return self.fallback();
        }

        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, content, similarity)| SchemaHint { content, similarity: Some(similarity) })
            .collect()
    }

    /// Hard-coded corpus of table/column descriptions and SQL exemplars,
    /// complete enough to answer every AGGREGATE_STATS query without
    /// retrieval (spec.md §8, invariant).
    pub fn fallback(&self) -> Vec<SchemaHint> {
        FALLBACK_CORPUS.iter().map(|content| SchemaHint { content: content.to_string(), similarity: None }).collect()
    }
}

/// Immutable, shared between requests (spec.md §5: "the hard-coded
/// fallback corpus (immutable)").
const FALLBACK_CORPUS: &[&str] = &[
    "Table teams(id bigint, code text unique, name text, logo_url text). `code` is a stable short team identifier, e.g. 'RM'.",
    "Table players(id bigint, player_code text, team_id bigint references teams(id), name text, position text, season text). (player_code, season) is unique.",
    "Table player_season_stats(id bigint, player_id bigint references players(id), season text, games_played int, points int, rebounds int, assists int, three_points_made int, pir int). One row per (player_id, season).",
    "Season codes look like 'E2025'; only the current season is populated.",
    "Exemplar: top scorers this season — SELECT p.name, t.code, s.points FROM player_season_stats s JOIN players p ON p.id = s.player_id JOIN teams t ON t.id = p.team_id WHERE s.season = 'E2025' ORDER BY s.points DESC LIMIT 10",
    "Exemplar: count of teams — SELECT COUNT(*) AS team_count FROM teams",
    "Exemplar: stats for a single team — SELECT p.name, s.points, s.rebounds, s.assists FROM player_season_stats s JOIN players p ON p.id = s.player_id JOIN teams t ON t.id = p.team_id WHERE t.code = 'RM' AND s.season = 'E2025'",
    "Exemplar: players grouped by position with average pir — SELECT p.position, AVG(s.pir) AS avg_pir FROM player_season_stats s JOIN players p ON p.id = s.player_id WHERE s.season = 'E2025' GROUP BY p.position",
    "There is no game-level or box-score data available; only season aggregates.",
];
