//! SQL Synthesizer (C8, spec.md §4.7).
//!
//! GENERAL_SQL only. Builds a prompt from system rules, retrieved schema
//! hints, recent conversation history, a few-shot block, and the canonical
//! query; invokes the LLM; parses and validates the response. One retry on
//! invalid output, per spec, not a second, independent LLM call.

use std::sync::Arc;

use crate::models::{Role, Turn};
use crate::providers::LlmProvider;
use crate::utils::error::{PipelineError, PipelineResult};
use crate::utils::sql_text::extract_first_statement;

use super::schema_kb::SchemaHint;

const UNSUPPORTED_TOKEN: &str = "UNSUPPORTED";

const SYSTEM_RULES_HEADER: &str = "You translate basketball statistics questions into a single read-only SQL \
statement for a PostgreSQL database.\n\
Rules:\n\
- Output exactly one statement: SELECT, WITH, or EXPLAIN only.\n\
- Never emit INSERT, UPDATE, DELETE, DROP, ALTER, CREATE, TRUNCATE, GRANT, REVOKE, COPY, CALL, MERGE, REPLACE, ATTACH, or DETACH.\n\
- Limit results to at most the row cap given below; include an explicit LIMIT.\n\
- Do not end the statement with a trailing semicolon.\n\
- Do not add commentary, explanations, or markdown outside the SQL itself.\n\
- Season codes look like 'E2025'.\n\
- If the question needs data outside the allowed schema below, output exactly the single token UNSUPPORTED and nothing else.";

const FEW_SHOT: &str = "Example: \"top 10 scorers this season\" ->\n\
SELECT p.name, t.code, s.points FROM player_season_stats s JOIN players p ON p.id = s.player_id JOIN teams t ON t.id = p.team_id WHERE s.season = 'E2025' ORDER BY s.points DESC LIMIT 10\n\
Example: \"how many teams are there\" ->\n\
SELECT COUNT(*) AS team_count FROM teams\n\
Example: \"stats for Real Madrid players\" ->\n\
SELECT p.name, s.points, s.rebounds, s.assists FROM player_season_stats s JOIN players p ON p.id = s.player_id JOIN teams t ON t.id = p.team_id WHERE t.code = 'RM' AND s.season = 'E2025'\n\
Example: \"average pir by position\" ->\n\
SELECT p.position, AVG(s.pir) AS avg_pir FROM player_season_stats s JOIN players p ON p.id = s.player_id WHERE s.season = 'E2025' GROUP BY p.position";

/// Renders `history` as a transcript block, oldest turn first, for follow-up
/// questions that refer back to the conversation ("and his rebounds?").
/// Empty when there is no history to carry.
fn format_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(|t| {
            let speaker = match t.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{speaker}: {}", t.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the full synthesis prompt for `query`, given `row_cap`, the
/// retrieved/fallback schema hints, and recent conversation `history`.
fn build_prompt(query: &str, row_cap: usize, hints: &[SchemaHint], history: &[Turn]) -> String {
    let schema_block: String = hints.iter().map(|h| format!("- {}", h.content)).collect::<Vec<_>>().join("\n");

    let history_block =
        if history.is_empty() { String::new() } else { format!("\nConversation so far:\n{}\n", format_history(history)) };

    format!(
        "{SYSTEM_RULES_HEADER}\nRow cap: {row_cap}.\n\nAllowed schema:\n{schema_block}\n{history_block}\n{FEW_SHOT}\n\nQuestion: {query}"
    )
}

/// Synthesizes SQL for `query` via the LLM, retrying once on invalid
/// output with a corrective hint, exactly as spec.md §4.7 allows. `history`
/// is recent conversation context (already trimmed by the caller) used to
/// resolve references in follow-up questions.
pub async fn synthesize(
    llm: &Arc<dyn LlmProvider>,
    query: &str,
    row_cap: usize,
    hints: &[SchemaHint],
    history: &[Turn],
) -> PipelineResult<String> {
    let prompt = build_prompt(query, row_cap, hints, history);

    let first = llm.synthesize_sql(&prompt).await?;
    match parse_response(&first)? {
        ParsedSql::Unsupported => Err(PipelineError::unsupported_query(
            "the question requires data outside the scope of what this system can query",
        )),
        ParsedSql::Statement(sql) => Ok(sql),
        ParsedSql::Invalid => {
            let retry_prompt =
                format!("{prompt}\n\nYour previous output was not valid SQL. Return only the SQL statement.");
            let second = llm.synthesize_sql(&retry_prompt).await?;
            match parse_response(&second)? {
                ParsedSql::Unsupported => Err(PipelineError::unsupported_query(
                    "the question requires data outside the scope of what this system can query",
                )),
                ParsedSql::Statement(sql) => Ok(sql),
                ParsedSql::Invalid => Err(PipelineError::llm_invalid_output(second)),
            }
        }
    }
}

enum ParsedSql {
    Statement(String),
    Unsupported,
    Invalid,
}

fn parse_response(raw: &str) -> PipelineResult<ParsedSql> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(UNSUPPORTED_TOKEN) {
        return Ok(ParsedSql::Unsupported);
    }

    let statement = extract_first_statement(trimmed);
    if statement.is_empty() {
        return Ok(ParsedSql::Invalid);
    }

    let leading_word = statement.split_whitespace().next().unwrap_or_default().to_uppercase();
    if matches!(leading_word.as_str(), "SELECT" | "WITH" | "EXPLAIN") {
        Ok(ParsedSql::Statement(statement))
    } else {
        Ok(ParsedSql::Invalid)
    }
}
