//! Deterministic Path (C10, spec.md §4.9).
//!
//! For AGGREGATE_STATS only. Never calls the LLM. `<stat>` is chosen from
//! the fixed [`StatColumn`] whitelist, never substituted from raw user
//! text; `season`/`team_code`/`top_n` are bound as `$1, $2, ...`
//! parameters rather than interpolated into the SQL string.

use crate::models::AggregateParams;

/// A parameterized statement plus its positional bind values, still
/// passed through [`super::validator::validate`] for defense in depth
/// (spec.md §4.9).
pub struct DeterministicQuery {
    pub sql: String,
    pub params: Vec<String>,
}

/// Builds `SELECT player.name, team.code, season_stats.<stat> FROM ...`
/// per spec.md §4.9, with an optional team filter.
pub fn build(params: &AggregateParams) -> DeterministicQuery {
    let stat_column = params.stat.column_name();

    match &params.team_code {
        Some(team_code) => DeterministicQuery {
            sql: format!(
                "SELECT p.name, t.code, s.{stat_column} FROM player_season_stats s \
                 JOIN players p ON p.id = s.player_id \
                 JOIN teams t ON t.id = p.team_id \
                 WHERE s.season = $1 AND t.code = $2 \
                 ORDER BY s.{stat_column} DESC LIMIT {}",
                params.top_n
            ),
            params: vec![params.season.clone(), team_code.clone()],
        },
        None => DeterministicQuery {
            sql: format!(
                "SELECT p.name, t.code, s.{stat_column} FROM player_season_stats s \
                 JOIN players p ON p.id = s.player_id \
                 JOIN teams t ON t.id = p.team_id \
                 WHERE s.season = $1 \
                 ORDER BY s.{stat_column} DESC LIMIT {}",
                params.top_n
            ),
            params: vec![params.season.clone()],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatColumn;

    #[test]
    fn builds_a_season_leaderboard_query_without_team_filter() {
        let params = AggregateParams { season: "E2025".into(), stat: StatColumn::Points, top_n: 10, team_code: None };
        let query = build(&params);
        assert!(query.sql.contains("s.points"));
        assert!(query.sql.contains("ORDER BY s.points DESC"));
        assert!(query.sql.contains("LIMIT 10"));
        assert_eq!(query.params, vec!["E2025"]);
    }

    #[test]
    fn builds_a_team_filtered_query_with_bound_team_code() {
        let params = AggregateParams {
            season: "E2025".into(),
            stat: StatColumn::Rebounds,
            top_n: 5,
            team_code: Some("RM".into()),
        };
        let query = build(&params);
        assert!(query.sql.contains("t.code = $2"));
        assert_eq!(query.params, vec!["E2025", "RM"]);
    }

    #[test]
    fn never_interpolates_raw_user_text_into_the_stat_column() {
        let params =
            AggregateParams { season: "E2025".into(), stat: StatColumn::Pir, top_n: 10, team_code: None };
        let query = build(&params);
        assert!(query.sql.contains("s.pir"));
        assert!(!query.params.iter().any(|p| p == "pir"));
    }
}
