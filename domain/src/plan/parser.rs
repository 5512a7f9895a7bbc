//! Plan parsing and normalization.
//!
//! Turns free-form planner output — numbered lists, bullets, inline-numbered
//! runs — into an ordered [`PlanState`] of canonical `TOOL: instruction`
//! steps, or a validation failure.
//!
//! Tool inference for untagged steps goes through the [`ToolInference`]
//! strategy so a grammar-constrained planner can swap the heuristic out
//! without touching the orchestrator.

use crate::core::error::DomainError;
use crate::plan::entities::{PlanState, PlanStep, ToolTag};
use regex::Regex;
use std::sync::LazyLock;

/// Splits inline-numbered runs ("1. SQL: ... 2. RAG: ...") onto lines.
static INLINE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(\d{1,2}[\.\)])\s+").expect("inline number pattern"));

/// Leading numbering or bullet marker at the start of a line.
static LINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[\.\)]\s*|[-•*]\s+)").expect("line marker pattern"));

/// Leading "Step N." / "N)" prefix left over after marker stripping.
static STEP_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:Step\s*)?\d+[\.\)]\s*").expect("step prefix pattern"));

/// Explicit `TAG:` prefix (any single word before the first colon).
static TAG_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]+)\s*:\s*(.*)$").expect("tag prefix pattern"));

/// Markdown emphasis characters the planner sometimes sprinkles in.
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_`]+").expect("emphasis pattern"));

static SQL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(SELECT|FROM|WHERE|JOIN|GROUP BY|ORDER BY|LIMIT|COUNT|SUM|AVG|revenue|income|cost|margin|quarter|trend|compare)\b")
        .expect("sql keyword pattern")
});

static ADVISORY_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(recommend|recommendation|should|strategy|strategic|improve|advise|advice)\b")
        .expect("advisory keyword pattern")
});

/// Strategy for inferring the tool of a step that carries no explicit tag.
pub trait ToolInference: Send + Sync {
    fn infer(&self, instruction: &str) -> ToolTag;
}

/// Keyword-based inference: query-like wording implies a structured query,
/// advice-like wording implies advisory, everything else falls back to
/// knowledge retrieval.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordToolInference;

impl ToolInference for KeywordToolInference {
    fn infer(&self, instruction: &str) -> ToolTag {
        if ADVISORY_KEYWORDS.is_match(instruction) {
            ToolTag::Advisory
        } else if SQL_KEYWORDS.is_match(instruction) {
            ToolTag::StructuredQuery
        } else {
            ToolTag::KnowledgeRetrieval
        }
    }
}

/// Extract candidate step lines from raw planner text.
///
/// Handles numbered lines, bullets, and inline "1. SQL: ... 2. RAG: ..."
/// runs. Continuation lines (no marker) are folded into the preceding step.
/// When no structural markers exist at all, every non-empty line is a step.
pub fn extract_steps(plan_text: &str) -> Vec<String> {
    let text = plan_text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    // Break inline-numbered runs onto their own lines first.
    let text = INLINE_NUMBER.replace_all(text, "\n$1 ");

    let mut steps: Vec<String> = Vec::new();
    let mut saw_marker = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(m) = LINE_MARKER.find(trimmed) {
            saw_marker = true;
            let content = trimmed[m.end()..].trim();
            if !content.is_empty() {
                steps.push(content.to_string());
            }
        } else if saw_marker {
            // Continuation of the previous step.
            if let Some(last) = steps.last_mut() {
                last.push(' ');
                last.push_str(trimmed);
            }
        } else {
            steps.push(trimmed.to_string());
        }
    }

    steps
        .into_iter()
        .map(|s| EMPHASIS.replace_all(&s, "").trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize one candidate line to `(ToolTag, "TOOL: instruction")`.
///
/// An explicit all-caps `TAG:` prefix must name a registered tool; anything
/// else is a validation failure. Untagged lines (including lowercase
/// `word:` prose) go through the inference strategy.
pub fn normalize_step(
    step: &str,
    inference: &dyn ToolInference,
) -> Result<(ToolTag, String), DomainError> {
    let s = STEP_PREFIX.replace(step.trim(), "");
    let s = s.trim();
    if s.is_empty() {
        return Err(DomainError::InvalidStep(step.to_string()));
    }

    if let Some(caps) = TAG_PREFIX.captures(s) {
        let word = &caps[1];
        let rest = caps[2].trim();
        match word.parse::<ToolTag>() {
            Ok(tool) => {
                if rest.is_empty() {
                    return Err(DomainError::InvalidStep(step.to_string()));
                }
                return Ok((tool, format!("{}: {}", tool.as_str(), rest)));
            }
            Err(e) => {
                // An uppercase prefix was clearly meant as a tool tag.
                if word.chars().all(|c| c.is_uppercase() || c == '_') {
                    return Err(e);
                }
                // Lowercase "note:"-style prose falls through to inference.
            }
        }
    }

    let tool = inference.infer(s);
    Ok((tool, format!("{}: {}", tool.as_str(), s)))
}

/// Validate planner output and build the initial [`PlanState`].
///
/// Errors: [`DomainError::EmptyPlan`], [`DomainError::NoActionableSteps`],
/// [`DomainError::UnknownTool`]/[`DomainError::InvalidStep`] for bad steps,
/// and [`DomainError::TooManySteps`] — which carries the normalized steps so
/// the caller can trim and continue as a policy decision.
pub fn validate_plan(
    plan_text: &str,
    max_steps: usize,
    inference: &dyn ToolInference,
) -> Result<PlanState, DomainError> {
    if plan_text.trim().is_empty() {
        return Err(DomainError::EmptyPlan);
    }

    let raw_steps = extract_steps(plan_text);
    if raw_steps.is_empty() {
        return Err(DomainError::NoActionableSteps);
    }

    let mut normalized = Vec::with_capacity(raw_steps.len());
    for raw in &raw_steps {
        normalized.push((raw.clone(), normalize_step(raw, inference)?));
    }

    if normalized.len() > max_steps {
        return Err(DomainError::TooManySteps {
            got: normalized.len(),
            max: max_steps,
            steps: normalized.into_iter().map(|(_, (_, n))| n).collect(),
        });
    }

    let steps = normalized
        .into_iter()
        .enumerate()
        .map(|(index, (raw, (tool, text)))| PlanStep::new(index, tool, raw, text))
        .collect();

    Ok(PlanState::new(steps))
}

/// Normalize pre-trimmed step texts into a [`PlanState`] without the step
/// count check. Used by the trim-and-continue policy after
/// [`DomainError::TooManySteps`].
pub fn plan_from_normalized(
    texts: Vec<String>,
    inference: &dyn ToolInference,
) -> Result<PlanState, DomainError> {
    let mut steps = Vec::with_capacity(texts.len());
    for (index, text) in texts.into_iter().enumerate() {
        let (tool, normalized) = normalize_step(&text, inference)?;
        steps.push(PlanStep::new(index, tool, text, normalized));
    }
    Ok(PlanState::new(steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::entities::StepStatus;

    fn inference() -> KeywordToolInference {
        KeywordToolInference
    }

    #[test]
    fn test_extract_numbered_lines() {
        let text = "1. SQL: Retrieve quarterly net income for 2024.\n2. RAG: Define net income.";
        let steps = extract_steps(text);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], "SQL: Retrieve quarterly net income for 2024.");
    }

    #[test]
    fn test_extract_bulleted_lines() {
        let text = "- SQL: total revenue\n• RAG: define EBITDA\n* ADVISORY: cost strategy";
        let steps = extract_steps(text);
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_extract_inline_numbered() {
        let text = "1. SQL: total revenue 2. RAG: define EBITDA";
        let steps = extract_steps(text);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1], "RAG: define EBITDA");
    }

    #[test]
    fn test_extract_strips_markdown_emphasis() {
        let steps = extract_steps("1. **SQL**: revenue `2024`");
        assert_eq!(steps, vec!["SQL: revenue 2024"]);
    }

    #[test]
    fn test_extract_fallback_plain_lines() {
        let text = "Fetch total revenue\n\nLook up the EBITDA definition";
        let steps = extract_steps(text);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_extract_continuation_lines_fold() {
        let text = "1. SQL: Retrieve revenue\n   for fiscal 2024\n2. RAG: define margin";
        let steps = extract_steps(text);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], "SQL: Retrieve revenue for fiscal 2024");
    }

    #[test]
    fn test_normalize_explicit_tags() {
        let (tool, text) = normalize_step("sql: select revenue", &inference()).unwrap();
        assert_eq!(tool, ToolTag::StructuredQuery);
        assert_eq!(text, "SQL: select revenue");

        let (tool, _) = normalize_step("Advisory: reduce costs", &inference()).unwrap();
        assert_eq!(tool, ToolTag::Advisory);
    }

    #[test]
    fn test_normalize_strips_step_prefix() {
        let (_, text) = normalize_step("Step 3. RAG: define EBITDA", &inference()).unwrap();
        assert_eq!(text, "RAG: define EBITDA");
    }

    #[test]
    fn test_normalize_infers_structured_query() {
        let (tool, text) =
            normalize_step("Compare revenue trend for the last 3 years", &inference()).unwrap();
        assert_eq!(tool, ToolTag::StructuredQuery);
        assert!(text.starts_with("SQL: "));
    }

    #[test]
    fn test_normalize_infers_advisory() {
        let (tool, _) =
            normalize_step("Provide a strategic recommendation on pricing", &inference()).unwrap();
        assert_eq!(tool, ToolTag::Advisory);
    }

    #[test]
    fn test_normalize_defaults_to_retrieval() {
        let (tool, text) = normalize_step("Look up the company charter", &inference()).unwrap();
        assert_eq!(tool, ToolTag::KnowledgeRetrieval);
        assert!(text.starts_with("RAG: "));
    }

    #[test]
    fn test_normalize_rejects_unknown_uppercase_tag() {
        let err = normalize_step("VIZ: plot revenue", &inference()).unwrap_err();
        assert!(matches!(err, DomainError::UnknownTool(_)));
    }

    #[test]
    fn test_normalize_lowercase_prose_colon_goes_through_inference() {
        let (tool, _) = normalize_step("note: check the filing date", &inference()).unwrap();
        assert_eq!(tool, ToolTag::KnowledgeRetrieval);
    }

    #[test]
    fn test_validate_spec_scenario() {
        let plan = validate_plan(
            "1. SQL: total revenue\n2. RAG: define EBITDA",
            12,
            &inference(),
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[0].tool, ToolTag::StructuredQuery);
        assert_eq!(plan.steps[0].normalized_text, "SQL: total revenue");
        assert_eq!(plan.steps[1].tool, ToolTag::KnowledgeRetrieval);
        assert_eq!(plan.steps[1].normalized_text, "RAG: define EBITDA");
        assert_eq!(plan.steps[1].status, StepStatus::Pending);
    }

    #[test]
    fn test_validate_empty_plan() {
        assert!(matches!(
            validate_plan("   \n  ", 12, &inference()),
            Err(DomainError::EmptyPlan)
        ));
    }

    #[test]
    fn test_validate_too_many_steps_carries_steps() {
        let text = (1..=13)
            .map(|i| format!("{i}. SQL: query {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        match validate_plan(&text, 12, &inference()) {
            Err(DomainError::TooManySteps { got, max, steps }) => {
                assert_eq!(got, 13);
                assert_eq!(max, 12);
                assert_eq!(steps.len(), 13);
                assert!(steps[0].starts_with("SQL: "));
            }
            other => panic!("expected TooManySteps, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_exact_budget_passes() {
        let text = (1..=12)
            .map(|i| format!("{i}. SQL: query {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let plan = validate_plan(&text, 12, &inference()).unwrap();
        assert_eq!(plan.len(), 12);
    }

    #[test]
    fn test_plan_from_normalized_after_trim() {
        let texts = vec!["SQL: a".to_string(), "RAG: b".to_string()];
        let plan = plan_from_normalized(texts, &inference()).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.steps[1].tool, ToolTag::KnowledgeRetrieval);
    }
}
