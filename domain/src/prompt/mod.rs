//! Prompt templates for each pipeline stage.

use crate::plan::entities::ToolTag;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Planner prompt: decompose the question into a numbered tool plan.
    pub fn planner(question: &str, visuals_allowed: bool, max_steps: usize) -> String {
        format!(
            r#"You are the Planner for a financial analysis assistant.

Create a short execution plan to answer the user question.

AVAILABLE TOOLS:
- SQL: for any numeric, financial, trend, comparison, or time-based question.
- RAG: for definitions, concepts, and document lookups.
- ADVISORY: for strategic questions, recommendations, or "should we" decisions.

RULES:
- Output ONLY a numbered list (max {max_steps} steps).
- Each step MUST use exactly one tool.
- Do NOT explain the plan.
- If time is not specified, use the most recent data.

VISUALIZATION:
- visuals_allowed = {visuals_allowed}
- If false, do NOT include visualization steps.

FORMAT (MANDATORY):
1. <TOOL>: <Action>

Examples:
1. SQL: Retrieve quarterly net income for 2024.
1. RAG: Define EBITDA.
1. ADVISORY: Provide a strategic recommendation on cost reduction.

User question: {question}
"#
        )
    }

    /// Repair prompt: regenerate only the flagged steps of a failing plan.
    pub fn repair(
        question: &str,
        auditor_message: &str,
        flagged_indices: &[usize],
        numbered_plan: &str,
    ) -> String {
        let flagged = flagged_indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"ORIGINAL QUESTION: {question}

AUDITOR FEEDBACK: {auditor_message}
FAILED STEP INDICES: [{flagged}]
CURRENT PLAN:
{numbered_plan}

Regenerate ONLY the failed steps as a numbered list in the same
`TOOL: instruction` format. Do not repeat steps that already succeeded.
"#
        )
    }

    /// Auditor prompt: validate the gathered context and synthesize, or
    /// demand a replan of specific step indices.
    pub fn audit(question: &str, context: &str, replans_left: usize) -> String {
        format!(
            r#"You are the Auditor for a financial analysis assistant.

Review the executed plan below and decide whether the gathered data is
sufficient to answer the user's question.

RULES:
1. Use ONLY the values shown - report them exactly as they appear.
2. Do NOT estimate, extrapolate, or assume units.
3. Do NOT mention databases, SQL, or internal systems.
4. If data is unavailable, say: "Data not available for this period."

You have {replans_left} replan(s) left. Respond with ONLY a JSON object:
{{
  "status": "OK" or "REPLAN_REQUIRED",
  "synthesized": "<your best answer from the data, 2-3 sentences>",
  "replan_indices": [<0-based indices of steps that must be redone>],
  "message": "<what is wrong with the flagged steps, or empty>"
}}

User question: {question}

Executed plan:
{context}
"#
        )
    }

    /// One-word intent classifier prompt.
    pub fn classify(question: &str) -> String {
        format!(
            r#"Classify the following user input into two categories:
1. CONVERSATIONAL: Greetings, small talk, questions about identity.
2. ANALYTICAL: Questions requiring data, numbers, financial info, or lookups.

Input: {question}

Return ONLY one word: CONVERSATIONAL or ANALYTICAL."#
        )
    }

    /// Direct reply prompt for the conversational shortcut.
    pub fn chat(question: &str) -> String {
        format!(
            "You are a helpful financial analysis assistant. User says: \"{question}\" \
             Reply concisely and professionally."
        )
    }

    /// System prompt for a reasoning-backed tool handler.
    pub fn tool_system(tool: ToolTag) -> &'static str {
        match tool {
            ToolTag::StructuredQuery => {
                r#"You are a structured-data analyst with access to quarterly financial
tables (revenue, costs, income, margins). Answer the instruction with the
concrete figures it asks for, stating periods explicitly. Report values
exactly; if the data would not exist, say so."#
            }
            ToolTag::KnowledgeRetrieval => {
                r#"You are a financial knowledge base. Answer the instruction with a
precise, sourced definition or explanation. Keep it short and factual;
say explicitly when something is outside the corpus."#
            }
            ToolTag::Advisory => {
                r#"You are a conservative financial advisory engine. Give a concrete,
actionable recommendation for the instruction, grounded in standard
financial practice. State assumptions and risks in one line each."#
            }
        }
    }
}
