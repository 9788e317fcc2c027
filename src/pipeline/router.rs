//! Query Router (C7, spec.md §4.6).
//!
//! Deterministic, no LLM. Classifies the canonical query into one of four
//! families over a lowercased, accent-stripped form. Never fails,
//! ambiguous inputs default to GENERAL_SQL.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{AggregateParams, QueryFamily, QueryPlan, StatColumn};

const MIN_TOP_N: u32 = 1;
const MAX_TOP_N: u32 = 100;
const DEFAULT_TOP_N: u32 = 10;

const GAME_LEVEL_MARKERS: &[&str] =
    &["partido", "partidos", "box score", "jornada", " vs ", " vs. ", "per game", "por partido"];

const LEADERBOARD_MARKERS: &[&str] = &["top", "mejores", "mejor", "mayor", "max", "maximo", "lideres", "lider"];

/// Stat keyword -> column, covering Spanish/English synonyms (spec.md §3,
/// SPEC_FULL §3: team/stat/season lexicons).
const STAT_LEXICON: &[(&str, StatColumn)] = &[
    ("points", StatColumn::Points),
    ("point", StatColumn::Points),
    ("puntos", StatColumn::Points),
    ("anotadores", StatColumn::Points),
    ("anotador", StatColumn::Points),
    ("scorers", StatColumn::Points),
    ("scorer", StatColumn::Points),
    ("rebounds", StatColumn::Rebounds),
    ("rebound", StatColumn::Rebounds),
    ("rebotes", StatColumn::Rebounds),
    ("rebote", StatColumn::Rebounds),
    ("assists", StatColumn::Assists),
    ("assist", StatColumn::Assists),
    ("asistencias", StatColumn::Assists),
    ("asistencia", StatColumn::Assists),
    ("three_points_made", StatColumn::ThreePointsMade),
    ("triples", StatColumn::ThreePointsMade),
    ("triple", StatColumn::ThreePointsMade),
    ("threes", StatColumn::ThreePointsMade),
    ("pir", StatColumn::Pir),
    ("valoracion", StatColumn::Pir),
    ("valoracion de jugador", StatColumn::Pir),
];

/// Team name -> code lexicon (Euroleague codes), spec.md §3 example "RM".
const TEAM_LEXICON: &[(&str, &str)] = &[
    ("real madrid", "RM"),
    ("madrid", "RM"),
    ("barcelona", "BAR"),
    ("barca", "BAR"),
    ("fenerbahce", "FEN"),
    ("olympiacos", "OLY"),
    ("panathinaikos", "PAN"),
    ("maccabi", "MTA"),
    ("anadolu efes", "EFS"),
    ("efes", "EFS"),
    ("monaco", "MON"),
    ("bayern", "MUN"),
    ("zalgiris", "ZAL"),
    ("partizan", "PAR"),
];

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").expect("valid regex"));
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,3})\b").expect("valid regex"));

/// Classifies `canonical_query` into a [`QueryPlan`]. `default_season_code`
/// is used when no explicit year can be extracted (spec §8: "Missing
/// season -> default season code").
pub fn route(canonical_query: &str, default_season_code: &str) -> QueryPlan {
    let normalized = strip_accents(&canonical_query.to_lowercase());

    if is_game_level(&normalized) {
        return QueryPlan::unsupported(
            canonical_query,
            "game-level and box-score data is not available; only season aggregates can be answered",
        );
    }

    if is_aggregate_stats(&normalized) {
        if let Some(stat) = extract_stat(&normalized) {
            let season = extract_season(&normalized, default_season_code);
            let top_n = extract_top_n(&normalized);
            let team_code = extract_team_code(&normalized);
            return QueryPlan::aggregate_stats(canonical_query, AggregateParams { season, stat, top_n, team_code });
        }
    }

    QueryPlan::general_sql(canonical_query)
}

fn is_game_level(normalized: &str) -> bool {
    let padded = format!(" {normalized} ");
    GAME_LEVEL_MARKERS.iter().any(|m| padded.contains(m))
}

fn is_aggregate_stats(normalized: &str) -> bool {
    let has_leaderboard_word = LEADERBOARD_MARKERS.iter().any(|m| normalized.contains(m));
    has_leaderboard_word && extract_stat(normalized).is_some()
}

fn extract_stat(normalized: &str) -> Option<StatColumn> {
    STAT_LEXICON
        .iter()
        .filter(|(keyword, _)| normalized.contains(keyword))
        .max_by_key(|(keyword, _)| keyword.len())
        .map(|(_, column)| *column)
}

fn extract_season(normalized: &str, default_season_code: &str) -> String {
    YEAR_RE
        .captures(normalized)
        .and_then(|c| c.get(1))
        .map(|m| format!("E{}", m.as_str()))
        .unwrap_or_else(|| default_season_code.to_string())
}

/// First integer in 1..=100, default 10 (spec §4.6, §8 boundary behavior).
fn extract_top_n(normalized: &str) -> u32 {
    for m in INT_RE.find_iter(normalized) {
        if let Ok(n) = m.as_str().parse::<u32>() {
            if (MIN_TOP_N..=MAX_TOP_N).contains(&n) {
                return n;
            }
        }
    }
    DEFAULT_TOP_N
}

fn extract_team_code(normalized: &str) -> Option<String> {
    TEAM_LEXICON.iter().find(|(name, _)| normalized.contains(name)).map(|(_, code)| code.to_string())
}

/// Strips the handful of accented characters that appear in Spanish
/// basketball queries. Not a full Unicode normalization, sufficient for
/// the lexicons above.
fn strip_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ñ' => 'n',
            'ü' => 'u',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_aggregate_stats_with_top_n_and_season() {
        let plan = route("Top 10 anotadores de esta temporada 2025", "E2025");
        assert_eq!(plan.family, QueryFamily::AggregateStats);
        let agg = plan.aggregate.expect("aggregate params");
        assert_eq!(agg.stat, StatColumn::Points);
        assert_eq!(agg.top_n, 10);
        assert_eq!(agg.season, "E2025");
    }

    #[test]
    fn game_level_query_is_unsupported() {
        let plan = route("Partidos de Larkin con mas de 10 puntos", "E2025");
        assert_eq!(plan.family, QueryFamily::Unsupported);
        assert!(plan.unsupported_reason.is_some());
    }

    #[test]
    fn ambiguous_query_defaults_to_general_sql() {
        let plan = route("Cuantos equipos hay?", "E2025");
        assert_eq!(plan.family, QueryFamily::GeneralSql);
    }

    #[test]
    fn top_n_out_of_range_falls_back_to_default() {
        let plan = route("top 500 rebounds this season", "E2025");
        let agg = plan.aggregate.expect("aggregate params");
        assert_eq!(agg.top_n, 10);
    }

    #[test]
    fn missing_season_defaults_to_configured_code() {
        let plan = route("top scorers", "E2025");
        let agg = plan.aggregate.expect("aggregate params");
        assert_eq!(agg.season, "E2025");
    }

    #[test]
    fn extracts_team_code_from_lexicon() {
        let plan = route("top 5 rebotes del real madrid", "E2025");
        let agg = plan.aggregate.expect("aggregate params");
        assert_eq!(agg.team_code.as_deref(), Some("RM"));
    }

    #[test]
    fn router_never_fails_on_empty_input() {
        let plan = route("", "E2025");
        assert_eq!(plan.family, QueryFamily::GeneralSql);
    }
}
