//! Step executor — runs one plan step with bounded retry.
//!
//! Failures here are data, not exceptions: after exhausting retries the
//! executor returns a Failed outcome embedding the last error, so the rest
//! of the plan can proceed with partial results.

use crate::ports::tool_registry::{ToolError, ToolRegistry};
use crate::use_cases::truncate;
use analyst_domain::ToolTag;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of executing one step, including how many attempts it took.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub success: bool,
    pub text: String,
    pub attempts: usize,
}

impl StepOutcome {
    fn ok(text: String, attempts: usize) -> Self {
        Self {
            success: true,
            text,
            attempts,
        }
    }

    fn failed(text: String, attempts: usize) -> Self {
        Self {
            success: false,
            text,
            attempts,
        }
    }
}

/// Executes single steps against the tool registry with linear backoff.
pub struct StepExecutor {
    tools: Arc<ToolRegistry>,
    max_retries: usize,
    retry_delay: Duration,
}

impl StepExecutor {
    pub fn new(tools: Arc<ToolRegistry>, max_retries: usize, retry_delay: Duration) -> Self {
        Self {
            tools,
            max_retries,
            retry_delay,
        }
    }

    /// Execute one normalized step.
    ///
    /// Retries handler errors up to `max_retries` additional times with an
    /// increasing delay (`retry_delay × attempt`). A missing handler is
    /// non-retryable. Never returns an error — the outcome carries it.
    pub async fn execute(&self, tool: ToolTag, instruction: &str) -> StepOutcome {
        let Some(handler) = self.tools.get(tool) else {
            let err = ToolError::NotRegistered(tool);
            warn!("{err}");
            return StepOutcome::failed(err.to_string(), 1);
        };

        let mut last_err = String::new();
        for attempt in 1..=self.max_retries + 1 {
            debug!(
                "Executing {tool} step (attempt {attempt}): {}",
                truncate(instruction, 200)
            );
            match handler.execute(instruction).await {
                Ok(output) => {
                    return StepOutcome::ok(output, attempt);
                }
                Err(e) => {
                    warn!("{tool} step failed (attempt {attempt}): {e}");
                    last_err = e.to_string();
                    if attempt <= self.max_retries {
                        tokio::time::sleep(self.retry_delay * attempt as u32).await;
                    }
                }
            }
        }

        let attempts = self.max_retries + 1;
        StepOutcome::failed(
            format!("Error executing step after {attempts} attempts: {last_err}"),
            attempts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tool_registry::ToolHandler;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyHandler {
        calls: Arc<AtomicUsize>,
        succeed_on: usize,
    }

    #[async_trait]
    impl ToolHandler for FlakyHandler {
        async fn execute(&self, _instruction: &str) -> Result<String, ToolError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.succeed_on {
                Ok(format!("ok after {n}"))
            } else {
                Err(ToolError::ExecutionFailed(format!("transient {n}")))
            }
        }
    }

    fn executor_with(succeed_on: usize, calls: Arc<AtomicUsize>) -> StepExecutor {
        let registry = ToolRegistry::new().register(
            ToolTag::StructuredQuery,
            Arc::new(FlakyHandler { calls, succeed_on }),
        );
        StepExecutor::new(Arc::new(registry), 2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = executor_with(1, calls.clone());

        let outcome = executor
            .execute(ToolTag::StructuredQuery, "total revenue")
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = executor_with(2, calls.clone());

        let outcome = executor
            .execute(ToolTag::StructuredQuery, "total revenue")
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_returns_failure_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        // Never succeeds within max_retries + 1 = 3 attempts.
        let executor = executor_with(usize::MAX, calls.clone());

        let outcome = executor
            .execute(ToolTag::StructuredQuery, "total revenue")
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(outcome.text.contains("after 3 attempts"));
        assert!(outcome.text.contains("transient 3"));
    }

    #[tokio::test]
    async fn test_long_multibyte_instruction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = executor_with(1, calls);

        // Long enough that a naive 200-byte cut would land inside a
        // multibyte character.
        let instruction = "€".repeat(120);
        let outcome = executor
            .execute(ToolTag::StructuredQuery, &instruction)
            .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_missing_handler_is_non_retryable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = executor_with(1, calls);

        let outcome = executor.execute(ToolTag::Advisory, "reduce costs").await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.text.contains("No handler registered"));
    }
}
