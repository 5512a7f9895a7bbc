//! Query intent classification result.

use serde::{Deserialize, Serialize};

/// Intent of a user query, as judged by the classifier.
///
/// Conversational queries (greetings, small talk, identity questions) skip
/// planning entirely; analytical queries go through the full pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Intent {
    Conversational,
    /// The safe default: when in doubt, run the pipeline.
    #[default]
    Analytical,
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Intent::Conversational => "CONVERSATIONAL",
            Intent::Analytical => "ANALYTICAL",
        }
    }

    /// Tolerant parse of classifier output. Anything that does not clearly
    /// say conversational is treated as analytical.
    pub fn parse(text: &str) -> Self {
        if text.to_uppercase().contains("CONVERSATIONAL") {
            Intent::Conversational
        } else {
            Intent::Analytical
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_tolerant() {
        assert_eq!(Intent::parse("CONVERSATIONAL"), Intent::Conversational);
        assert_eq!(Intent::parse("  conversational\n"), Intent::Conversational);
        assert_eq!(Intent::parse("ANALYTICAL"), Intent::Analytical);
        assert_eq!(Intent::parse("garbled output"), Intent::Analytical);
        assert_eq!(Intent::parse(""), Intent::Analytical);
    }
}
