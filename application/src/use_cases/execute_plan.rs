//! Concurrent execution coordinator.
//!
//! Fans every Pending/Failed step of a plan out through the step executor,
//! bounded by a counting semaphore, and fans back in before returning — the
//! auditor never sees a half-finished round. Steps that are already Ok are
//! left untouched, so re-running a round is idempotent.

use crate::ports::audit_trail::{AuditTrail, InteractionEvent};
use crate::use_cases::execute_step::StepExecutor;
use analyst_domain::{PlanState, QueryId};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Coordinates one round of concurrent step execution.
pub struct PlanCoordinator {
    executor: Arc<StepExecutor>,
    max_workers: usize,
}

impl PlanCoordinator {
    pub fn new(executor: Arc<StepExecutor>, max_workers: usize) -> Self {
        Self {
            executor,
            max_workers: max_workers.max(1),
        }
    }

    /// Execute all Pending/Failed steps, updating the plan in place.
    ///
    /// Returns the number of steps executed this round. Completion order is
    /// unspecified; each worker owns exactly one step index, so write-backs
    /// never collide.
    pub async fn run_round(
        &self,
        plan: &mut PlanState,
        query_id: &QueryId,
        trail: &dyn AuditTrail,
    ) -> usize {
        let pending = plan.pending_indices();
        if pending.is_empty() {
            debug!("No pending steps; round is a no-op");
            return 0;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut join_set = JoinSet::new();

        for idx in pending {
            let step = &plan.steps[idx];
            let tool = step.tool;
            let instruction = step.instruction().to_string();
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("step semaphore closed");
                let outcome = executor.execute(tool, &instruction).await;
                (idx, outcome)
            });
        }

        let mut executed = 0;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((idx, outcome)) => {
                    executed += 1;
                    let step = &mut plan.steps[idx];
                    trail.record(InteractionEvent::new(
                        query_id.clone(),
                        "worker",
                        "tool_call",
                        step.normalized_text.clone(),
                        Some(outcome.text.clone()),
                    ));
                    if outcome.success {
                        debug!("Step {} ok after {} attempt(s)", idx + 1, outcome.attempts);
                        step.mark_ok(outcome.text, outcome.attempts);
                    } else {
                        warn!("Step {} failed: {}", idx + 1, outcome.text);
                        step.mark_failed(outcome.text, outcome.attempts);
                    }
                }
                Err(e) => {
                    // A panicked worker leaves its step Pending; the stall
                    // guard in the replan loop keeps this from spinning.
                    warn!("Step task join error: {e}");
                }
            }
        }

        executed
    }
}
