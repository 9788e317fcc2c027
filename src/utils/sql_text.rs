//! SQL text munging helpers shared by the synthesizer (C8) and the safety
//! validator (C9).
//!
//! Each rule is a standalone function with its own unit test, so C8/C9
//! compose them instead of re-implementing ad hoc string munging.

/// Strips a leading/trailing Markdown code fence (```sql ... ``` or ``` ... ```).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("sql").unwrap_or(rest);
        let rest = rest.trim_start_matches(['\n', '\r']);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
        return rest.trim();
    }
    trimmed
}

/// Removes `/* ... */` and `-- ...` comments so they cannot hide a
/// blacklisted keyword from the tokenizer.
pub fn strip_sql_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        if in_single {
            out.push(c);
            if c == '\'' {
                in_single = false;
            }
            continue;
        }
        if in_double {
            out.push(c);
            if c == '"' {
                in_double = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_single = true;
                out.push(c);
            }
            '"' => {
                in_double = true;
                out.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Strips a single trailing semicolon (and any trailing whitespace after it).
/// Returns an error description if more than one top-level semicolon-terminated
/// statement is present.
pub fn strip_trailing_semicolon(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}

/// Counts top-level statement separators (semicolons outside quotes), used
/// by the validator's single-statement rule.
pub fn count_statement_separators(sql: &str) -> usize {
    let mut count = 0;
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ';' if !in_single && !in_double => {
                // A trailing semicolon (nothing but whitespace after it) does
                // not count as a statement separator.
                if chars.clone().any(|c| !c.is_whitespace()) {
                    count += 1;
                }
            }
            _ => {}
        }
    }
    count
}

/// Tokenizes SQL into whitespace/punctuation-delimited words, uppercased,
/// for keyword scanning. Content inside string literals is excluded.
pub fn tokenize_keywords(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.is_empty() {
            tokens.push(current.to_uppercase());
            current.clear();
        }
    };

    for c in sql.chars() {
        match c {
            '\'' if !in_double => {
                flush(&mut current, &mut tokens);
                in_single = !in_single;
            }
            '"' if !in_single => {
                flush(&mut current, &mut tokens);
                in_double = !in_double;
            }
            c if in_single || in_double => {}
            c if c.is_alphanumeric() || c == '_' => current.push(c),
            _ => flush(&mut current, &mut tokens),
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// Extracts the first SQL statement from a (possibly fenced, possibly
/// commented) LLM response: strips fences, strips comments, strips the
/// trailing semicolon.
pub fn extract_first_statement(raw: &str) -> String {
    let unfenced = strip_code_fences(raw);
    let uncommented = strip_sql_comments(unfenced);
    strip_trailing_semicolon(&uncommented)
}
