//! Use cases — the orchestration logic of the system.
//!
//! [`run_query::RunQueryUseCase`] is the public entry point; the step
//! executor and plan coordinator are its internal building blocks, split
//! out so the retry and fan-out mechanics stay testable in isolation.

pub mod execute_plan;
pub mod execute_step;
pub mod run_query;

pub use execute_plan::PlanCoordinator;
pub use execute_step::{StepExecutor, StepOutcome};
pub use run_query::{
    CANCELLED_MESSAGE, RunQueryInput, RunQueryOutput, RunQueryUseCase, TIMEOUT_MESSAGE,
};

/// Truncate to at most `max` characters, never splitting a multibyte
/// character. For log lines carrying user or model text.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
