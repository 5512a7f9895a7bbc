//! Pipeline parameters — orchestration loop control.
//!
//! [`PipelineParams`] groups the static parameters that bound the
//! pipeline in [`RunQueryUseCase`](crate::use_cases::run_query::RunQueryUseCase).
//! These are application-layer concerns, not domain policy.
//!
//! The sequential, non-repairing pipeline variant is just the degenerate
//! configuration `max_workers = 1`, `max_replans = 0`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestration loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Overall deadline for one end-to-end invocation.
    pub timeout: Duration,
    /// Maximum number of steps a plan may contain.
    pub max_steps: usize,
    /// Maximum number of repair rounds per invocation.
    pub max_replans: usize,
    /// Concurrency cap for step execution.
    pub max_workers: usize,
    /// Additional attempts per step after the first failure.
    pub max_retries: usize,
    /// Base delay for the linear per-attempt backoff.
    pub retry_delay: Duration,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_steps: 12,
            max_replans: 2,
            max_workers: 4,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl PipelineParams {
    // ==================== Builder Methods ====================

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    pub fn with_max_replans(mut self, max: usize) -> Self {
        self.max_replans = max;
        self
    }

    pub fn with_max_workers(mut self, max: usize) -> Self {
        self.max_workers = max.max(1);
        self
    }

    pub fn with_max_retries(mut self, max: usize) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// The sequential, non-repairing configuration.
    pub fn sequential(self) -> Self {
        self.with_max_workers(1).with_max_replans(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = PipelineParams::default();
        assert_eq!(params.timeout, Duration::from_secs(120));
        assert_eq!(params.max_steps, 12);
        assert_eq!(params.max_replans, 2);
        assert_eq!(params.max_workers, 4);
        assert_eq!(params.max_retries, 2);
        assert_eq!(params.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_builder() {
        let params = PipelineParams::default()
            .with_max_steps(6)
            .with_max_workers(0)
            .with_retry_delay(Duration::from_millis(50));

        assert_eq!(params.max_steps, 6);
        // Worker count is clamped to at least one.
        assert_eq!(params.max_workers, 1);
        assert_eq!(params.retry_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_sequential_configuration() {
        let params = PipelineParams::default().sequential();
        assert_eq!(params.max_workers, 1);
        assert_eq!(params.max_replans, 0);
    }
}
