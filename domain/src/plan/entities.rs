//! Plan domain entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Tool a plan step dispatches to.
///
/// The set is closed: unrecognized tags fail at parse time, never at
/// execution time. Wire names follow the planner grammar (`SQL:`, `RAG:`,
/// `ADVISORY:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolTag {
    /// Structured query against tabular data.
    StructuredQuery,
    /// Knowledge retrieval from the document corpus.
    KnowledgeRetrieval,
    /// Strategic recommendation from the advisory rules.
    Advisory,
}

impl ToolTag {
    /// Canonical wire name used in normalized step text.
    pub fn as_str(&self) -> &str {
        match self {
            ToolTag::StructuredQuery => "SQL",
            ToolTag::KnowledgeRetrieval => "RAG",
            ToolTag::Advisory => "ADVISORY",
        }
    }

    /// All registered tags, in display order.
    pub fn all() -> &'static [ToolTag] {
        &[
            ToolTag::StructuredQuery,
            ToolTag::KnowledgeRetrieval,
            ToolTag::Advisory,
        ]
    }
}

impl std::str::FromStr for ToolTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SQL" => Ok(ToolTag::StructuredQuery),
            "RAG" => Ok(ToolTag::KnowledgeRetrieval),
            "ADVISORY" => Ok(ToolTag::Advisory),
            other => Err(DomainError::UnknownTool(other.to_string())),
        }
    }
}

impl std::fmt::Display for ToolTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StepStatus {
    /// Step has not been executed yet
    #[default]
    Pending,
    /// Step executed successfully
    Ok,
    /// Step failed after exhausting retries
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Ok => "ok",
            StepStatus::Failed => "failed",
        }
    }

    /// Steps in these states are picked up by the next execution round.
    pub fn needs_execution(&self) -> bool {
        matches!(self, StepStatus::Pending | StepStatus::Failed)
    }
}

/// A single unit of work within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Position in the plan (stable across replans)
    pub index: usize,
    /// Which tool this step invokes
    pub tool: ToolTag,
    /// The planner's original line
    pub raw_text: String,
    /// Canonical `TOOL: instruction` form
    pub normalized_text: String,
    /// Current status
    pub status: StepStatus,
    /// Result text, set once the step is Ok or Failed
    pub result: Option<String>,
    /// Number of execution attempts so far
    pub attempts: usize,
}

impl PlanStep {
    pub fn new(
        index: usize,
        tool: ToolTag,
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
    ) -> Self {
        Self {
            index,
            tool,
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            status: StepStatus::Pending,
            result: None,
            attempts: 0,
        }
    }

    /// The instruction part of the normalized text (after `TOOL:`).
    pub fn instruction(&self) -> &str {
        match self.normalized_text.split_once(':') {
            Some((_, rest)) => rest.trim(),
            None => self.normalized_text.as_str(),
        }
    }

    pub fn mark_ok(&mut self, result: impl Into<String>, attempts: usize) {
        self.status = StepStatus::Ok;
        self.result = Some(result.into());
        self.attempts = attempts;
    }

    pub fn mark_failed(&mut self, result: impl Into<String>, attempts: usize) {
        self.status = StepStatus::Failed;
        self.result = Some(result.into());
        self.attempts = attempts;
    }

    /// Reset to Pending, clearing any previous outcome. Used when the replan
    /// controller swaps in a regenerated step.
    pub fn replace_text(&mut self, tool: ToolTag, normalized: impl Into<String>) {
        let normalized = normalized.into();
        self.tool = tool;
        self.raw_text = normalized.clone();
        self.normalized_text = normalized;
        self.status = StepStatus::Pending;
        self.result = None;
        self.attempts = 0;
    }
}

/// The full plan for one invocation.
///
/// Step order is display/context order, not a dependency order — steps are
/// independent, which is what makes concurrent execution safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanState {
    pub steps: Vec<PlanStep>,
    /// Number of repair rounds performed so far
    pub replan_count: usize,
}

impl PlanState {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self {
            steps,
            replan_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Indices of steps that still need execution (Pending or Failed).
    pub fn pending_indices(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status.needs_execution())
            .map(|(i, _)| i)
            .collect()
    }

    /// True when no step is Pending or Failed.
    pub fn all_settled_ok(&self) -> bool {
        self.steps.iter().all(|s| !s.status.needs_execution())
    }

    /// Assemble the synthesis context in plan order, regardless of the
    /// order in which steps completed.
    pub fn context_text(&self) -> String {
        self.steps
            .iter()
            .map(|s| {
                format!(
                    "Step: {}\nResult: {}",
                    s.normalized_text,
                    s.result.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The current plan as a numbered list, for the repair prompt.
    pub fn numbered(&self) -> String {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s.normalized_text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Merge regenerated steps back into the plan.
    ///
    /// - If the regenerated count equals the whole plan, the plan is
    ///   replaced outright.
    /// - Otherwise regenerated steps map positionally onto the flagged
    ///   indices; out-of-range indices are ignored. Overflow steps are
    ///   appended while the plan stays within `max_steps`; the rest are
    ///   dropped.
    ///
    /// All touched steps reset to Pending. Increments `replan_count`.
    pub fn merge_repaired(
        &mut self,
        repaired: Vec<(ToolTag, String)>,
        flagged: &[usize],
        max_steps: usize,
    ) {
        if repaired.len() == self.steps.len() {
            self.steps = repaired
                .into_iter()
                .enumerate()
                .map(|(i, (tool, text))| PlanStep::new(i, tool, text.clone(), text))
                .collect();
        } else {
            let mut repaired = repaired.into_iter();
            for &idx in flagged {
                let Some((tool, text)) = repaired.next() else {
                    break;
                };
                if let Some(step) = self.steps.get_mut(idx) {
                    step.replace_text(tool, text);
                }
            }
            for (tool, text) in repaired {
                if self.steps.len() >= max_steps {
                    break;
                }
                let index = self.steps.len();
                self.steps
                    .push(PlanStep::new(index, tool, text.clone(), text));
            }
        }
        self.replan_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(index: usize, tool: ToolTag, text: &str) -> PlanStep {
        PlanStep::new(index, tool, text, text)
    }

    fn plan(texts: &[&str]) -> PlanState {
        PlanState::new(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| step(i, ToolTag::StructuredQuery, t))
                .collect(),
        )
    }

    #[test]
    fn test_tool_tag_round_trip() {
        for tag in ToolTag::all() {
            assert_eq!(tag.as_str().parse::<ToolTag>().unwrap(), *tag);
        }
        assert_eq!("sql".parse::<ToolTag>().unwrap(), ToolTag::StructuredQuery);
        assert!("VIZ".parse::<ToolTag>().is_err());
    }

    #[test]
    fn test_instruction_extraction() {
        let s = step(0, ToolTag::KnowledgeRetrieval, "RAG: define EBITDA");
        assert_eq!(s.instruction(), "define EBITDA");
    }

    #[test]
    fn test_pending_indices() {
        let mut p = plan(&["SQL: a", "SQL: b", "SQL: c"]);
        p.steps[0].mark_ok("done", 1);
        p.steps[2].mark_failed("boom", 3);
        assert_eq!(p.pending_indices(), vec![1, 2]);
        assert!(!p.all_settled_ok());
    }

    #[test]
    fn test_context_in_plan_order() {
        let mut p = plan(&["SQL: first", "SQL: second"]);
        // Complete out of order — context must stay in plan order.
        p.steps[1].mark_ok("r2", 1);
        p.steps[0].mark_ok("r1", 1);
        let ctx = p.context_text();
        let first = ctx.find("r1").unwrap();
        let second = ctx.find("r2").unwrap();
        assert!(first < second);
        assert!(ctx.starts_with("Step: SQL: first\nResult: r1"));
    }

    #[test]
    fn test_merge_full_replacement() {
        let mut p = plan(&["SQL: a", "SQL: b"]);
        p.steps[0].mark_ok("done", 1);
        p.merge_repaired(
            vec![
                (ToolTag::KnowledgeRetrieval, "RAG: x".to_string()),
                (ToolTag::StructuredQuery, "SQL: y".to_string()),
            ],
            &[1],
            12,
        );
        assert_eq!(p.len(), 2);
        assert_eq!(p.steps[0].normalized_text, "RAG: x");
        assert_eq!(p.steps[0].status, StepStatus::Pending);
        assert_eq!(p.replan_count, 1);
    }

    #[test]
    fn test_merge_positional_mapping() {
        let mut p = plan(&["SQL: a", "SQL: b", "SQL: c"]);
        p.steps.iter_mut().for_each(|s| s.mark_ok("done", 1));
        p.merge_repaired(
            vec![(ToolTag::Advisory, "ADVISORY: new b".to_string())],
            &[1],
            12,
        );
        assert_eq!(p.steps[1].normalized_text, "ADVISORY: new b");
        assert_eq!(p.steps[1].status, StepStatus::Pending);
        assert_eq!(p.steps[0].status, StepStatus::Ok);
        assert_eq!(p.steps[2].status, StepStatus::Ok);
    }

    #[test]
    fn test_merge_overflow_appends_up_to_max() {
        let mut p = plan(&["SQL: a", "SQL: b", "SQL: c"]);
        p.merge_repaired(
            vec![
                (ToolTag::StructuredQuery, "SQL: r1".to_string()),
                (ToolTag::StructuredQuery, "SQL: r2".to_string()),
            ],
            &[0],
            4,
        );
        // One mapped onto index 0, one appended (plan grows to 4 = max).
        assert_eq!(p.len(), 4);
        assert_eq!(p.steps[0].normalized_text, "SQL: r1");
        assert_eq!(p.steps[3].normalized_text, "SQL: r2");

        // A further overflow beyond max_steps is dropped.
        p.merge_repaired(
            vec![
                (ToolTag::StructuredQuery, "SQL: r3".to_string()),
                (ToolTag::StructuredQuery, "SQL: r4".to_string()),
            ],
            &[1],
            4,
        );
        assert_eq!(p.len(), 4);
        assert_eq!(p.steps[1].normalized_text, "SQL: r3");
        assert_eq!(p.replan_count, 2);
    }

    #[test]
    fn test_merge_ignores_out_of_range_indices() {
        let mut p = plan(&["SQL: a", "SQL: b"]);
        p.steps.iter_mut().for_each(|s| s.mark_ok("done", 1));
        p.merge_repaired(
            vec![(ToolTag::StructuredQuery, "SQL: new".to_string())],
            &[99],
            12,
        );
        // Flag is out of range: the regenerated step is consumed by the
        // mapping attempt, the plan text stays put.
        assert_eq!(p.steps[0].normalized_text, "SQL: a");
        assert_eq!(p.steps[1].normalized_text, "SQL: b");
        assert_eq!(p.replan_count, 1);
    }

    #[test]
    fn test_merge_equal_counts_replaces_despite_stale_flags() {
        // When the regenerated count matches the whole plan the replacement
        // branch wins, even if the flagged indices are nonsense.
        let mut p = plan(&["SQL: a"]);
        p.merge_repaired(
            vec![(ToolTag::StructuredQuery, "SQL: new".to_string())],
            &[99],
            12,
        );
        assert_eq!(p.steps[0].normalized_text, "SQL: new");
        assert_eq!(p.steps[0].status, StepStatus::Pending);
        assert_eq!(p.replan_count, 1);
    }
}
