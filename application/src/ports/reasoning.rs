//! Reasoning Service port
//!
//! Defines the interface to the natural-language reasoning engine that
//! produces plans, verdicts, and synthesized prose. Implementations
//! (adapters) live in the infrastructure layer.

use analyst_domain::{Intent, Verdict};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during reasoning service calls
#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ReasoningError {
    /// Rate limiting is the one failure worth retrying against a fallback
    /// model configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReasoningError::RateLimited)
    }
}

/// Port to the external reasoning engine.
///
/// The orchestrator guarantees process-level properties around whatever
/// this service returns; it does not vouch for semantic correctness.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Produce a plan (ideally a numbered `TOOL: instruction` list) for the
    /// question. Also used with a repair prompt during replanning.
    async fn plan(&self, prompt: &str) -> Result<String, ReasoningError>;

    /// Review the gathered context and either accept the synthesis or flag
    /// step indices for replanning.
    async fn audit(
        &self,
        question: &str,
        context: &str,
        replans_left: usize,
    ) -> Result<Verdict, ReasoningError>;

    /// Classify the query's intent. Adapters should fall back to
    /// [`Intent::Analytical`] rather than fail the whole invocation.
    async fn classify(&self, question: &str) -> Result<Intent, ReasoningError>;

    /// Direct reply for the conversational shortcut.
    async fn chat(&self, question: &str) -> Result<String, ReasoningError>;
}
