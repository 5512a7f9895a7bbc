//! Question value object.
//!
//! Wraps the raw request text and peels off the control envelope the web
//! layer wraps around it: an optional visualization-authorization prefix
//! and an optional conversation-history block ending in `User Query:`.

use serde::{Deserialize, Serialize};

/// Marker prefix that authorizes visualization output for this query.
pub const VISUALS_MARKER: &str = "[GRAPH_REQ]";

/// Marker separating injected conversation history from the actual query.
const USER_QUERY_MARKER: &str = "User Query:";

/// A user question with control prefixes already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
    visuals_allowed: bool,
}

impl Question {
    /// Parse raw request text, stripping the visuals marker if present.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix(VISUALS_MARKER) {
            Self {
                content: rest.trim().to_string(),
                visuals_allowed: true,
            }
        } else {
            Self {
                content: trimmed.to_string(),
                visuals_allowed: false,
            }
        }
    }

    /// The question text (history context included, marker stripped).
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the caller authorized visualization output.
    pub fn visuals_allowed(&self) -> bool {
        self.visuals_allowed
    }

    /// The bare user query, without any injected conversation history.
    ///
    /// Used for logging and intent classification so that stale history
    /// does not skew the classifier.
    pub fn bare_query(&self) -> &str {
        match self.content.rfind(USER_QUERY_MARKER) {
            Some(pos) => self.content[pos + USER_QUERY_MARKER.len()..].trim(),
            None => &self.content,
        }
    }
}

impl From<&str> for Question {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_question() {
        let q = Question::parse("What was net income in 2024?");
        assert_eq!(q.content(), "What was net income in 2024?");
        assert!(!q.visuals_allowed());
        assert_eq!(q.bare_query(), q.content());
    }

    #[test]
    fn test_visuals_marker_stripped() {
        let q = Question::parse("[GRAPH_REQ] Show revenue trend");
        assert_eq!(q.content(), "Show revenue trend");
        assert!(q.visuals_allowed());
    }

    #[test]
    fn test_bare_query_extraction() {
        let q = Question::parse(
            "Context:\nQ: revenue? -> A: $5B\nUser Query: What about costs?",
        );
        assert_eq!(q.bare_query(), "What about costs?");
        assert!(q.content().starts_with("Context:"));
    }

    #[test]
    fn test_marker_only_at_start() {
        let q = Question::parse("Tell me about [GRAPH_REQ]");
        assert!(!q.visuals_allowed());
    }
}
