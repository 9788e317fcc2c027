//! Ephemeral conversation state.
//!
//! `Turn`s live only for the duration of one request; only the last `N`
//! are passed to the orchestrator, and only `user`/`assistant` text is
//! used, tool outputs never re-enter the prompt.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Default number of trailing turns carried into the prompt when the
/// caller does not specify a tighter window. See DESIGN.md for the
/// rationale behind this value.
pub const DEFAULT_HISTORY_TURNS: usize = 6;

/// Returns at most the last `max_turns` entries of `history`, preserving order.
pub fn trim_history(history: &[Turn], max_turns: usize) -> &[Turn] {
    let len = history.len();
    if len <= max_turns { history } else { &history[len - max_turns..] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_last_n_turns() {
        let history: Vec<Turn> = (0..10).map(|i| Turn::user(format!("turn {i}"))).collect();
        let trimmed = trim_history(&history, 3);
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed[0].content, "turn 7");
        assert_eq!(trimmed[2].content, "turn 9");
    }

    #[test]
    fn shorter_history_is_unchanged() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        assert_eq!(trim_history(&history, DEFAULT_HISTORY_TURNS).len(), 2);
    }
}
