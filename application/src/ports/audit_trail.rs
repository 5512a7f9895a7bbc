//! Audit trail port
//!
//! Records agent interactions (planner output, worker tool calls, auditor
//! verdicts, cancellations) for debugging. Recording is fire-and-forget:
//! a failing trail never fails the pipeline.

use analyst_domain::QueryId;

/// One recorded interaction.
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub query_id: QueryId,
    /// Logical actor: "user", "planner", "worker", "auditor", "pipeline".
    pub agent: String,
    /// What happened: "input", "output", "tool_call", "cancelled", ...
    pub action: String,
    pub input: String,
    pub output: Option<String>,
}

impl InteractionEvent {
    pub fn new(
        query_id: QueryId,
        agent: impl Into<String>,
        action: impl Into<String>,
        input: impl Into<String>,
        output: Option<String>,
    ) -> Self {
        Self {
            query_id,
            agent: agent.into(),
            action: action.into(),
            input: input.into(),
            output,
        }
    }
}

/// Port for recording interaction events.
pub trait AuditTrail: Send + Sync {
    fn record(&self, event: InteractionEvent);
}

/// No-op audit trail for when recording is not needed
pub struct NoAuditTrail;

impl AuditTrail for NoAuditTrail {
    fn record(&self, _event: InteractionEvent) {}
}
