//! Query session types.
//!
//! A [`QuerySession`] identifies one end-to-end invocation. The process-wide
//! registries that track live sessions and progress live in the application
//! layer; these are the entities they store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier for one query invocation (Value Object).
///
/// Caller-supplied (so the web layer can poll/cancel) or generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(String);

impl QueryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from the current timestamp and a process-local
    /// counter. Unique within the process, which is the registry's scope.
    pub fn generate() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!(
            "q-{}-{:04x}",
            Utc::now().timestamp_millis(),
            n & 0xffff
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QueryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for QueryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal and non-terminal states of a query session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    TimedOut,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::TimedOut => "timed_out",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// One end-to-end invocation (Entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySession {
    pub id: QueryId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl QuerySession {
    pub fn new(id: QueryId) -> Self {
        Self {
            id,
            status: SessionStatus::Running,
            created_at: Utc::now(),
        }
    }

    pub fn finish(&mut self, status: SessionStatus) {
        self.status = status;
    }
}

/// Ephemeral UI-facing status for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Logical stage name: planner, worker, auditor, ...
    pub agent: String,
    /// Free-text description of the current step.
    pub step: String,
}

impl ProgressRecord {
    pub fn new(agent: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            step: step.into(),
        }
    }

    /// What a poller sees before the pipeline has published anything,
    /// or after the entry was cleared.
    pub fn initializing() -> Self {
        Self::new("initializing", "starting")
    }
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::initializing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = QueryId::generate();
        let b = QueryId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = QuerySession::new(QueryId::new("q-1"));
        assert_eq!(session.status, SessionStatus::Running);
        assert!(!session.status.is_terminal());

        session.finish(SessionStatus::Completed);
        assert!(session.status.is_terminal());
    }

    #[test]
    fn test_session_serde_round_trip() {
        let session = QuerySession::new(QueryId::new("q-1"));
        let json = serde_json::to_string(&session).unwrap();
        let back: QuerySession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, session.id);
        assert_eq!(back.created_at, session.created_at);
    }

    #[test]
    fn test_progress_default() {
        let record = ProgressRecord::default();
        assert_eq!(record.agent, "initializing");
        assert_eq!(record.step, "starting");
    }
}
