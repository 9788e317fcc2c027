//! SQL Safety Validator (C9, spec.md §4.8).
//!
//! Pure function, no I/O. Rules are applied in the exact order spec.md
//! lists them; any violation rejects before the statement reaches C2.

use crate::utils::error::{PipelineError, PipelineResult};
use crate::utils::sql_text::{count_statement_separators, strip_sql_comments, strip_trailing_semicolon, tokenize_keywords};

const BLACKLIST: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "GRANT", "REVOKE", "COPY", "CALL", "MERGE",
    "REPLACE", "ATTACH", "DETACH",
];

const WHITELIST_LEADING: &[&str] = &["SELECT", "WITH", "EXPLAIN"];

const BLOCKED_SCHEMAS: &[&str] = &["INFORMATION_SCHEMA", "PG_CATALOG"];

/// Validates `sql` against the safety rules, returning the (possibly
/// row-cap-rewritten) statement on success.
///
/// Idempotent: calling `validate` again on the returned statement with the
/// same `row_cap` yields the same statement unchanged (spec.md §8,
/// round-trip law).
pub fn validate(sql: &str, row_cap: usize) -> PipelineResult<String> {
    let without_trailing_semicolon = strip_trailing_semicolon(sql);
    let uncommented = strip_sql_comments(&without_trailing_semicolon);

    if count_statement_separators(&uncommented) > 0 {
        return Err(PipelineError::sql_unsafe("more than one SQL statement"));
    }

    let trimmed = uncommented.trim();

    let leading_word = trimmed.split_whitespace().next().unwrap_or_default().to_uppercase();
    if !WHITELIST_LEADING.contains(&leading_word.as_str()) {
        return Err(PipelineError::sql_unsafe(format!(
            "statement must begin with SELECT, WITH, or EXPLAIN (found '{leading_word}')"
        )));
    }

    let tokens = tokenize_keywords(&uncommented);
    if let Some(forbidden) = tokens.iter().find(|t| BLACKLIST.contains(&t.as_str())) {
        return Err(PipelineError::sql_unsafe(format!("blacklisted keyword '{forbidden}'")));
    }
    if tokens.iter().any(|t| BLOCKED_SCHEMAS.contains(&t.as_str())) {
        return Err(PipelineError::sql_unsafe("information_schema/pg_catalog access is not allowed"));
    }

    Ok(apply_row_cap(&uncommented, row_cap))
}

/// Appends `LIMIT row_cap` when the statement has no top-level `LIMIT`
/// clause, or tightens an existing one that exceeds the cap. Only the
/// final (outermost) `LIMIT` is treated as top-level; this is a
/// conservative heuristic that works for the statement shapes this
/// pipeline synthesizes (no nested `LIMIT` inside a final subquery).
fn apply_row_cap(sql: &str, row_cap: usize) -> String {
    let trimmed = sql.trim();
    let upper = trimmed.to_uppercase();

    if let Some(idx) = upper.rfind("LIMIT") {
        let after = trimmed[idx + "LIMIT".len()..].trim();
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        if let Ok(existing) = digits.parse::<usize>() {
            if existing > row_cap {
                let prefix = trimmed[..idx].trim_end();
                return format!("{prefix} LIMIT {row_cap}");
            }
            return trimmed.to_string();
        }
    }

    format!("{trimmed} LIMIT {row_cap}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_plain_select() {
        let sql = validate("SELECT 1", 1000).unwrap();
        assert_eq!(sql, "SELECT 1 LIMIT 1000");
    }

    #[test]
    fn rejects_multiple_statements() {
        let err = validate("SELECT 1; DROP TABLE players", 1000).unwrap_err();
        assert_eq!(err.code(), "SQL_UNSAFE");
    }

    #[test]
    fn rejects_blacklisted_keyword_even_inside_a_cte() {
        let sql = "WITH x AS (DELETE FROM players RETURNING id) SELECT * FROM x";
        let err = validate(sql, 1000).unwrap_err();
        assert_eq!(err.code(), "SQL_UNSAFE");
    }

    #[test]
    fn semicolon_hidden_inside_a_comment_does_not_count_as_a_second_statement() {
        let sql = validate("SELECT 1 /* a;b */", 1000).unwrap();
        assert_eq!(sql, "SELECT 1 LIMIT 1000");
    }

    #[test]
    fn blacklisted_keyword_hidden_in_a_comment_is_still_caught_if_elsewhere() {
        let sql = "SELECT 1 -- DROP TABLE players\nFROM dual";
        assert!(validate(sql, 1000).is_ok());
    }

    #[test]
    fn rejects_non_select_leading_keyword() {
        let err = validate("EXPLAIN ANALYZE DELETE FROM players", 1000).unwrap_err();
        assert_eq!(err.code(), "SQL_UNSAFE");
    }

    #[test]
    fn rewrites_limit_exceeding_row_cap() {
        let sql = validate("SELECT * FROM players LIMIT 999999", 1000).unwrap();
        assert_eq!(sql, "SELECT * FROM players LIMIT 1000");
    }

    #[test]
    fn leaves_limit_within_cap_untouched() {
        let sql = validate("SELECT * FROM players LIMIT 5", 1000).unwrap();
        assert_eq!(sql, "SELECT * FROM players LIMIT 5");
    }

    #[test]
    fn blocks_information_schema_access() {
        let err = validate("SELECT * FROM information_schema.tables", 1000).unwrap_err();
        assert_eq!(err.code(), "SQL_UNSAFE");
    }

    #[test]
    fn validation_is_idempotent_on_row_cap_rewriting() {
        let first = validate("SELECT * FROM players LIMIT 999999", 1000).unwrap();
        let second = validate(&first, 1000).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn strips_a_single_trailing_semicolon() {
        let sql = validate("SELECT 1;", 1000).unwrap();
        assert_eq!(sql, "SELECT 1 LIMIT 1000");
    }
}
