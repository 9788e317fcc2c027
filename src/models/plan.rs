//! `QueryPlan`, the output of the Query Router (C7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryFamily {
    AggregateStats,
    GameLevel,
    GeneralSql,
    Unsupported,
}

/// Stat columns the deterministic path and the synthesizer's exemplars are
/// allowed to reference. Never substituted from raw user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatColumn {
    Points,
    Rebounds,
    Assists,
    ThreePointsMade,
    Pir,
}

impl StatColumn {
    pub fn column_name(self) -> &'static str {
        match self {
            StatColumn::Points => "points",
            StatColumn::Rebounds => "rebounds",
            StatColumn::Assists => "assists",
            StatColumn::ThreePointsMade => "three_points_made",
            StatColumn::Pir => "pir",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateParams {
    pub season: String,
    pub stat: StatColumn,
    pub top_n: u32,
    pub team_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlan {
    pub family: QueryFamily,
    pub canonical_query: String,
    pub aggregate: Option<AggregateParams>,
    /// Populated for UNSUPPORTED/GAME_LEVEL so the orchestrator can surface
    /// an explanatory message without re-deriving it.
    pub unsupported_reason: Option<String>,
}

impl QueryPlan {
    pub fn general_sql(canonical_query: impl Into<String>) -> Self {
        Self {
            family: QueryFamily::GeneralSql,
            canonical_query: canonical_query.into(),
            aggregate: None,
            unsupported_reason: None,
        }
    }

    pub fn unsupported(canonical_query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            family: QueryFamily::Unsupported,
            canonical_query: canonical_query.into(),
            aggregate: None,
            unsupported_reason: Some(reason.into()),
        }
    }

    pub fn aggregate_stats(canonical_query: impl Into<String>, params: AggregateParams) -> Self {
        Self {
            family: QueryFamily::AggregateStats,
            canonical_query: canonical_query.into(),
            aggregate: Some(params),
            unsupported_reason: None,
        }
    }
}
