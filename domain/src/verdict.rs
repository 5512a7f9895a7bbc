//! Auditor verdicts.
//!
//! The auditor reviews the assembled step context and either accepts the
//! synthesis or flags specific step indices for replanning. Verdicts arrive
//! as JSON — either fenced in a code block or raw — and parsing is tolerant:
//! anything that does not clearly demand a replan is an acceptance, with the
//! raw text as the best-effort answer.

use serde::{Deserialize, Serialize};

/// Outcome of an audit round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    /// Evidence suffices; the synthesized answer stands.
    Ok,
    /// Specific steps need to be regenerated and re-executed.
    ReplanRequired,
}

/// Structured auditor output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    /// The synthesized answer — final on acceptance, best-effort otherwise.
    pub synthesized_answer: String,
    /// Step indices flagged for replanning (0-based, may be out of range —
    /// the replan controller ignores invalid ones).
    pub replan_indices: Vec<usize>,
    /// Diagnostic text explaining the verdict.
    pub message: String,
}

impl Verdict {
    pub fn ok(answer: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Ok,
            synthesized_answer: answer.into(),
            replan_indices: Vec::new(),
            message: String::new(),
        }
    }

    pub fn replan(
        answer: impl Into<String>,
        indices: Vec<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: VerdictStatus::ReplanRequired,
            synthesized_answer: answer.into(),
            replan_indices: indices,
            message: message.into(),
        }
    }

    pub fn requires_replan(&self) -> bool {
        self.status == VerdictStatus::ReplanRequired
    }

    /// Parse auditor response text into a verdict.
    ///
    /// Looks for a JSON object (fenced ```json block first, then the whole
    /// text) with `status`, `synthesized`, `replan_indices`, `message`
    /// fields. Text that is not valid JSON is an acceptance carrying the
    /// text verbatim.
    pub fn parse(text: &str) -> Self {
        if let Some(json) = extract_json(text)
            && let Some(verdict) = Self::from_json(&json)
        {
            return verdict;
        }
        Verdict::ok(text.trim())
    }

    fn from_json(json: &serde_json::Value) -> Option<Self> {
        let status_text = json.get("status")?.as_str()?.to_uppercase();
        let synthesized = json
            .get("synthesized")
            .or_else(|| json.get("synthesized_answer"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let message = json
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let indices: Vec<usize> = json
            .get("replan_indices")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_u64().map(|n| n as usize))
                    .collect()
            })
            .unwrap_or_default();

        // A replan demand with no indices is not actionable; treat it as an
        // acceptance so a misbehaving auditor cannot spin the loop.
        if status_text.contains("REPLAN") && !indices.is_empty() {
            Some(Verdict::replan(synthesized, indices, message))
        } else {
            Some(Verdict {
                status: VerdictStatus::Ok,
                synthesized_answer: synthesized,
                replan_indices: Vec::new(),
                message,
            })
        }
    }
}

/// Find a JSON object in the text: fenced ```json / ``` block first,
/// then the whole trimmed text.
fn extract_json(text: &str) -> Option<serde_json::Value> {
    let mut in_block = false;
    let mut block = String::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            if let Ok(value) = serde_json::from_str(&block) {
                return Some(value);
            }
            in_block = false;
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    serde_json::from_str(text.trim()).ok()
}
