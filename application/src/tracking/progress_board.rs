//! Progress board — human-readable status for polling clients.

use analyst_domain::{ProgressRecord, QueryId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-wide map from query id to its latest [`ProgressRecord`].
///
/// Written by every pipeline stage, read by polling clients, cleared when
/// the invocation terminates so stale status never leaks into a later
/// invocation that reuses the same id.
#[derive(Default)]
pub struct ProgressBoard {
    records: Mutex<HashMap<QueryId, ProgressRecord>>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status for the id.
    pub fn publish(&self, id: &QueryId, agent: &str, step: &str) {
        self.records
            .lock()
            .expect("progress board poisoned")
            .insert(id.clone(), ProgressRecord::new(agent, step));
    }

    /// Current status, or the initializing default when unknown.
    pub fn get(&self, id: &QueryId) -> ProgressRecord {
        self.records
            .lock()
            .expect("progress board poisoned")
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop the entry for a finished invocation.
    pub fn clear(&self, id: &QueryId) {
        self.records
            .lock()
            .expect("progress board poisoned")
            .remove(id);
    }

    pub fn contains(&self, id: &QueryId) -> bool {
        self.records
            .lock()
            .expect("progress board poisoned")
            .contains_key(id)
    }
}
