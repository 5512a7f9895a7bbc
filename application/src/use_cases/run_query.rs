//! Run Query use case — the pipeline façade.
//!
//! Wraps one end-to-end invocation: intent classification, planning,
//! concurrent step execution, audit/synthesis, and the bounded replan loop,
//! all under an overall deadline and explicit cancellation. Registry and
//! progress entries are cleared on every exit path.

use crate::config::PipelineParams;
use crate::ports::audit_trail::{AuditTrail, InteractionEvent, NoAuditTrail};
use crate::ports::reasoning::{ReasoningError, ReasoningService};
use crate::ports::tool_registry::ToolRegistry;
use crate::tracking::{CancelOutcome, ProgressBoard, SessionRegistry};
use crate::use_cases::execute_plan::PlanCoordinator;
use crate::use_cases::execute_step::StepExecutor;
use crate::use_cases::truncate;
use analyst_domain::{
    DomainError, Intent, KeywordToolInference, PlanState, ProgressRecord, PromptTemplate,
    Question, QueryId, SessionStatus, ToolInference, Verdict, plan_from_normalized,
    validate_plan,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Stable user-facing message for an explicit cancellation.
pub const CANCELLED_MESSAGE: &str = "Query cancelled by user.";

/// Stable user-facing message for an overall deadline expiry.
pub const TIMEOUT_MESSAGE: &str =
    "Query timed out. Please try a more specific question.";

/// User-safe message for reasoning-service failures. Detail goes to logs.
const GENERIC_FAILURE_MESSAGE: &str =
    "An internal error occurred while answering this question. Please try again.";

/// Canned reply when even the conversational path fails.
const CHAT_FALLBACK_REPLY: &str = "Hello! How can I assist you today?";

/// Terminal failures inside one pipeline run. Cancellation and timeout are
/// handled outside, at the select; step failures are data, never errors.
#[derive(Error, Debug)]
enum PipelineError {
    #[error("Planner output invalid: {0}")]
    Validation(DomainError),

    #[error("Reasoning service failure: {0}")]
    Reasoning(#[from] ReasoningError),
}

/// Input for the [`RunQueryUseCase`].
#[derive(Debug, Clone)]
pub struct RunQueryInput {
    /// Raw request text, possibly carrying control prefixes.
    pub question: String,
    /// Caller-supplied id for polling/cancellation; generated when absent.
    pub query_id: Option<QueryId>,
}

impl RunQueryInput {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            query_id: None,
        }
    }

    pub fn with_query_id(mut self, id: impl Into<QueryId>) -> Self {
        self.query_id = Some(id.into());
        self
    }
}

/// Result of one invocation. Always produced — failures, timeouts, and
/// cancellations arrive here as distinct statuses with stable messages,
/// never as panics or leaked registry entries.
#[derive(Debug, Clone)]
pub struct RunQueryOutput {
    pub query_id: QueryId,
    pub status: SessionStatus,
    pub answer: String,
}

/// Use case for running one query end to end.
#[derive(Clone)]
pub struct RunQueryUseCase {
    reasoning: Arc<dyn ReasoningService>,
    tools: Arc<ToolRegistry>,
    sessions: Arc<SessionRegistry>,
    progress: Arc<ProgressBoard>,
    trail: Arc<dyn AuditTrail>,
    inference: Arc<dyn ToolInference>,
    params: PipelineParams,
}

impl RunQueryUseCase {
    pub fn new(
        reasoning: Arc<dyn ReasoningService>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionRegistry>,
        progress: Arc<ProgressBoard>,
        params: PipelineParams,
    ) -> Self {
        Self {
            reasoning,
            tools,
            sessions,
            progress,
            trail: Arc::new(NoAuditTrail),
            inference: Arc::new(KeywordToolInference),
            params,
        }
    }

    /// Attach an audit trail.
    pub fn with_audit_trail(mut self, trail: Arc<dyn AuditTrail>) -> Self {
        self.trail = trail;
        self
    }

    /// Replace the tool inference strategy used for untagged plan steps.
    pub fn with_tool_inference(mut self, inference: Arc<dyn ToolInference>) -> Self {
        self.inference = inference;
        self
    }

    /// Execute one invocation under the overall deadline.
    pub async fn execute(&self, input: RunQueryInput) -> RunQueryOutput {
        let query_id = input.query_id.unwrap_or_else(QueryId::generate);
        let question = Question::parse(&input.question);

        info!(
            "Starting query {query_id}: {}",
            truncate(question.bare_query(), 200)
        );

        let handle = self.sessions.register(&query_id);
        self.progress
            .publish(&query_id, "planner", "Analyzing question...");
        self.trail.record(InteractionEvent::new(
            query_id.clone(),
            "user",
            "input",
            question.bare_query().to_string(),
            None,
        ));

        // The pinned future outlives the select arms, so it borrows its own
        // copy of the id and the output below can take the original.
        let pipeline_id = query_id.clone();
        let pipeline = self.run_pipeline(&pipeline_id, &question);
        tokio::pin!(pipeline);

        let (status, answer) = tokio::select! {
            _ = handle.cancelled() => {
                info!("Query {query_id} cancelled by caller");
                self.trail.record(InteractionEvent::new(
                    query_id.clone(),
                    "pipeline",
                    "cancelled",
                    "user_cancelled".to_string(),
                    None,
                ));
                (SessionStatus::Cancelled, CANCELLED_MESSAGE.to_string())
            }
            result = tokio::time::timeout(self.params.timeout, &mut pipeline) => {
                match result {
                    Ok(Ok(answer)) => (SessionStatus::Completed, answer),
                    Ok(Err(PipelineError::Validation(e))) => {
                        warn!("Query {query_id} rejected: {e}");
                        (SessionStatus::Failed, format!("Planner output invalid: {e}"))
                    }
                    Ok(Err(PipelineError::Reasoning(e))) => {
                        error!("Query {query_id} reasoning failure: {e}");
                        (SessionStatus::Failed, GENERIC_FAILURE_MESSAGE.to_string())
                    }
                    Err(_) => {
                        warn!("Query {query_id} exceeded the {}s deadline", self.params.timeout.as_secs());
                        self.trail.record(InteractionEvent::new(
                            query_id.clone(),
                            "pipeline",
                            "cancelled",
                            "timeout".to_string(),
                            None,
                        ));
                        (SessionStatus::TimedOut, TIMEOUT_MESSAGE.to_string())
                    }
                }
            }
        };

        // Every exit path lands here: the registry entry and progress
        // record must not outlive the invocation. When a newer invocation
        // has re-registered the same id, both now belong to it — leave them.
        if self.sessions.remove(&query_id, &handle) {
            self.progress.clear(&query_id);
        }

        RunQueryOutput {
            query_id,
            status,
            answer,
        }
    }

    /// Signal cancellation for a running query.
    pub fn cancel(&self, id: &QueryId) -> CancelOutcome {
        self.sessions.cancel(id)
    }

    /// Current progress for a query id, defaulting to "initializing".
    pub fn status(&self, id: &QueryId) -> ProgressRecord {
        self.progress.get(id)
    }

    // ==================== Pipeline stages ====================

    async fn run_pipeline(
        &self,
        query_id: &QueryId,
        question: &Question,
    ) -> Result<String, PipelineError> {
        // Conversational queries skip planning entirely.
        if self.classify(question).await == Intent::Conversational {
            return Ok(self.chat_reply(query_id, question).await);
        }

        let mut plan = self.initial_plan(query_id, question).await?;

        let executor = Arc::new(StepExecutor::new(
            Arc::clone(&self.tools),
            self.params.max_retries,
            self.params.retry_delay,
        ));
        let coordinator = PlanCoordinator::new(executor, self.params.max_workers);

        // Replan loop: execute pending steps, audit, repair, repeat —
        // bounded by max_replans and the stall guard.
        loop {
            self.progress
                .publish(query_id, "worker", "Executing plan steps...");
            coordinator
                .run_round(&mut plan, query_id, self.trail.as_ref())
                .await;

            self.progress
                .publish(query_id, "auditor", "Validating results...");
            let replans_left = self.params.max_replans - plan.replan_count;
            let context = plan.context_text();
            let verdict = self
                .audit_with_fallback(question.content(), &context, replans_left)
                .await?;
            self.trail.record(InteractionEvent::new(
                query_id.clone(),
                "auditor",
                "validation",
                context,
                Some(verdict.synthesized_answer.clone()),
            ));

            if !verdict.requires_replan() {
                info!("Query {query_id} accepted after {} replan(s)", plan.replan_count);
                return Ok(best_effort(&verdict));
            }

            if plan.replan_count >= self.params.max_replans {
                info!(
                    "Query {query_id} exhausted its replan budget ({}); returning best effort",
                    self.params.max_replans
                );
                return Ok(best_effort(&verdict));
            }

            if !self.repair(query_id, question, &mut plan, &verdict).await {
                // A failed repair would leave the loop re-running the same
                // steps for the same auditor; stop with what we have.
                return Ok(best_effort(&verdict));
            }

            if plan.pending_indices().is_empty() {
                // Nothing left to execute, yet the auditor still demands a
                // replan. Bail out rather than loop forever.
                warn!("Query {query_id} replan stalled; returning best effort");
                return Ok(best_effort(&verdict));
            }
        }
    }

    async fn classify(&self, question: &Question) -> Intent {
        match self.reasoning.classify(question.bare_query()).await {
            Ok(intent) => {
                debug!("Intent classified as {intent}");
                intent
            }
            Err(e) => {
                warn!("Intent classification failed: {e}. Defaulting to ANALYTICAL.");
                Intent::Analytical
            }
        }
    }

    async fn chat_reply(&self, query_id: &QueryId, question: &Question) -> String {
        self.progress.publish(query_id, "chat", "Responding...");
        let reply = match self.reasoning.chat(question.bare_query()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Conversational path failed: {e}");
                CHAT_FALLBACK_REPLY.to_string()
            }
        };
        self.trail.record(InteractionEvent::new(
            query_id.clone(),
            "chat",
            "output",
            question.bare_query().to_string(),
            Some(reply.clone()),
        ));
        reply
    }

    async fn initial_plan(
        &self,
        query_id: &QueryId,
        question: &Question,
    ) -> Result<PlanState, PipelineError> {
        let prompt = PromptTemplate::planner(
            question.content(),
            question.visuals_allowed(),
            self.params.max_steps,
        );
        let plan_text = self.plan_with_fallback(&prompt).await?;
        self.trail.record(InteractionEvent::new(
            query_id.clone(),
            "planner",
            "output",
            question.bare_query().to_string(),
            Some(plan_text.clone()),
        ));

        self.validate_with_trim(&plan_text)
            .map_err(PipelineError::Validation)
    }

    /// Parse planner output. An over-budget plan is trimmed to `max_steps`
    /// and kept — that policy belongs to the façade, not the parser.
    fn validate_with_trim(&self, plan_text: &str) -> Result<PlanState, DomainError> {
        match validate_plan(plan_text, self.params.max_steps, self.inference.as_ref()) {
            Ok(plan) => Ok(plan),
            Err(DomainError::TooManySteps { got, max, steps }) => {
                warn!("Planner produced {got} steps; trimming to {max}");
                let trimmed = steps.into_iter().take(max).collect();
                plan_from_normalized(trimmed, self.inference.as_ref())
            }
            Err(e) => Err(e),
        }
    }

    /// Ask the planner to regenerate the flagged steps and merge the result.
    /// Returns false when the repair could not be produced or parsed, in
    /// which case the plan is left untouched.
    async fn repair(
        &self,
        query_id: &QueryId,
        question: &Question,
        plan: &mut PlanState,
        verdict: &Verdict,
    ) -> bool {
        self.progress
            .publish(query_id, "planner", "Repairing plan...");
        info!(
            "Query {query_id} replanning steps {:?} (round {})",
            verdict.replan_indices,
            plan.replan_count + 1
        );

        let prompt = PromptTemplate::repair(
            question.content(),
            &verdict.message,
            &verdict.replan_indices,
            &plan.numbered(),
        );
        let repaired_text = match self.plan_with_fallback(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Repair planning failed: {e}");
                return false;
            }
        };
        self.trail.record(InteractionEvent::new(
            query_id.clone(),
            "planner",
            "repair",
            prompt,
            Some(repaired_text.clone()),
        ));

        let repaired = match self.validate_with_trim(&repaired_text) {
            Ok(state) => state
                .steps
                .into_iter()
                .map(|s| (s.tool, s.normalized_text))
                .collect(),
            Err(e) => {
                warn!("Repaired plan invalid: {e}");
                return false;
            }
        };

        plan.merge_repaired(repaired, &verdict.replan_indices, self.params.max_steps);
        true
    }

    // ==================== Reasoning calls with rate-limit fallback ====================

    async fn plan_with_fallback(&self, prompt: &str) -> Result<String, ReasoningError> {
        match self.reasoning.plan(prompt).await {
            Err(e) if e.is_recoverable() => {
                warn!("Planner call rate limited; retrying once against fallback configuration");
                self.reasoning.plan(prompt).await
            }
            other => other,
        }
    }

    async fn audit_with_fallback(
        &self,
        question: &str,
        context: &str,
        replans_left: usize,
    ) -> Result<Verdict, ReasoningError> {
        match self.reasoning.audit(question, context, replans_left).await {
            Err(e) if e.is_recoverable() => {
                warn!("Auditor call rate limited; retrying once against fallback configuration");
                self.reasoning.audit(question, context, replans_left).await
            }
            other => other,
        }
    }
}

/// The best answer the invocation can return when the verdict is final,
/// guaranteed non-empty.
fn best_effort(verdict: &Verdict) -> String {
    if !verdict.synthesized_answer.trim().is_empty() {
        verdict.synthesized_answer.clone()
    } else if !verdict.message.trim().is_empty() {
        verdict.message.clone()
    } else {
        "I could not verify a complete answer from the available data.".to_string()
    }
}
