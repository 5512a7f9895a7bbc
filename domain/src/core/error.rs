//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Planner returned an empty plan")]
    EmptyPlan,

    #[error("No actionable steps found in planner output")]
    NoActionableSteps,

    #[error("Planner returned too many steps ({got}). Max allowed is {max}.")]
    TooManySteps {
        got: usize,
        max: usize,
        /// Steps that were parsed before the limit tripped. The caller may
        /// choose to trim and continue instead of aborting.
        steps: Vec<String>,
    },

    #[error("Invalid step format (must start with a tool tag): '{0}'")]
    InvalidStep(String),

    #[error("Unknown tool tag: {0}")]
    UnknownTool(String),

    #[error("Query cancelled by caller")]
    Cancelled,

    #[error("Query timed out")]
    TimedOut,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Check if this error is the recoverable step-count boundary
    pub fn is_too_many_steps(&self) -> bool {
        matches!(self, DomainError::TooManySteps { .. })
    }
}
