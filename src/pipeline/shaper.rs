//! Result Shaper (C11, spec.md §4.10).
//!
//! Decides a visualization tag from the shape of the rows and the query
//! family. Value serialization itself (2-decimal rounding, null
//! preservation) already happens in [`crate::db::row_to_json_map`]; this
//! module only classifies shape.

use crate::db::Rows;
use crate::models::{QueryFamily, Visualization};
use serde_json::Value;

const TEMPORAL_COLUMN_NAMES: &[&str] = &["round", "date", "game_date", "jornada"];

/// Shapes `rows` for `family`, returning the visualization tag and the
/// row data (already row-capped by the Data Access Layer).
pub fn shape(rows: Rows, family: QueryFamily) -> (Visualization, Vec<serde_json::Map<String, Value>>) {
    let visualization = if family == QueryFamily::AggregateStats && has_numeric_column(&rows) && rows.rows.len() > 1 {
        Visualization::Bar
    } else if has_temporal_and_single_numeric_column(&rows) {
        Visualization::Line
    } else {
        Visualization::Table
    };

    (visualization, rows.rows)
}

fn has_numeric_column(rows: &Rows) -> bool {
    rows.rows.iter().any(|row| row.values().any(|v| v.is_number()))
}

fn has_temporal_and_single_numeric_column(rows: &Rows) -> bool {
    let has_temporal = rows.columns.iter().any(|c| TEMPORAL_COLUMN_NAMES.contains(&c.as_str()));
    if !has_temporal {
        return false;
    }

    let numeric_columns = rows
        .columns
        .iter()
        .filter(|c| !TEMPORAL_COLUMN_NAMES.contains(&c.as_str()))
        .filter(|c| rows.rows.iter().any(|row| row.get(*c).map(|v| v.is_number()).unwrap_or(false)))
        .count();

    numeric_columns == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn aggregate_stats_with_multiple_numeric_rows_is_bar() {
        let rows = Rows {
            columns: vec!["name".into(), "points".into()],
            rows: vec![
                row(&[("name", json!("A")), ("points", json!(20))]),
                row(&[("name", json!("B")), ("points", json!(15))]),
            ],
            truncated: false,
        };
        let (viz, data) = shape(rows, QueryFamily::AggregateStats);
        assert_eq!(viz, Visualization::Bar);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn single_row_aggregate_is_table_not_bar() {
        let rows = Rows {
            columns: vec!["team_count".into()],
            rows: vec![row(&[("team_count", json!(18))])],
            truncated: false,
        };
        let (viz, _) = shape(rows, QueryFamily::GeneralSql);
        assert_eq!(viz, Visualization::Table);
    }

    #[test]
    fn temporal_column_with_single_numeric_is_line() {
        let rows = Rows {
            columns: vec!["round".into(), "points".into()],
            rows: vec![
                row(&[("round", json!(1)), ("points", json!(10))]),
                row(&[("round", json!(2)), ("points", json!(14))]),
            ],
            truncated: false,
        };
        let (viz, _) = shape(rows, QueryFamily::GeneralSql);
        assert_eq!(viz, Visualization::Line);
    }

    #[test]
    fn empty_rows_shape_as_table() {
        let rows = Rows { columns: vec![], rows: vec![], truncated: false };
        let (viz, data) = shape(rows, QueryFamily::GeneralSql);
        assert_eq!(viz, Visualization::Table);
        assert!(data.is_empty());
    }
}
