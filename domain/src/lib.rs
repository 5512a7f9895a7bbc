//! Domain layer for analyst
//!
//! This crate contains the core business logic for the query orchestration
//! pipeline: plan entities and parsing, auditor verdicts, query sessions,
//! and prompt templates. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! - **Plan**: an ordered list of tool-tagged steps derived from a question.
//!   Steps are independent of each other, which makes concurrent execution
//!   safe; order only matters for context assembly.
//! - **Verdict**: the auditor's judgment — accept the synthesis, or flag
//!   specific step indices for a bounded replan.
//! - **Session**: one end-to-end invocation, identified by a [`QueryId`],
//!   trackable and cancellable while it runs.

pub mod core;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod verdict;

// Re-export commonly used types
pub use crate::core::{
    error::DomainError,
    intent::Intent,
    question::{Question, VISUALS_MARKER},
};
pub use plan::{
    entities::{PlanState, PlanStep, StepStatus, ToolTag},
    parser::{
        KeywordToolInference, ToolInference, extract_steps, normalize_step, plan_from_normalized,
        validate_plan,
    },
};
pub use prompt::PromptTemplate;
pub use session::{ProgressRecord, QueryId, QuerySession, SessionStatus};
pub use verdict::{Verdict, VerdictStatus};
