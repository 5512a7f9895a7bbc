//! Query session registry — cancellation handles for in-flight queries.

use analyst_domain::QueryId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
}

impl CancelOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            CancelOutcome::Cancelled => "cancelled",
            CancelOutcome::NotFound => "not_found",
        }
    }
}

/// One invocation's handle on its registry entry.
///
/// Carries the cancellation token plus the generation stamped at
/// registration, so cleanup can tell its own entry apart from a newer one
/// registered under the same id.
pub struct SessionHandle {
    token: CancellationToken,
    generation: u64,
}

impl SessionHandle {
    /// Wait until this invocation is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Entry {
    token: CancellationToken,
    generation: u64,
}

/// Process-wide map from query id to a cancellable execution handle.
///
/// Invariant: at most one live handle per id. Registering over an existing
/// id cancels the previous handle first — the web layer reuses ids when a
/// client retries. The displaced invocation's cleanup then runs with a
/// stale handle and must not evict the new entry, hence the generation
/// check in [`SessionRegistry::remove`].
///
/// Every mutation is a single key insert/update/delete, so a plain mutex
/// suffices; there are no multi-key transactions.
#[derive(Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<QueryId, Entry>>,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh cancellation token for the id and return a handle
    /// that identifies this invocation's entry.
    pub fn register(&self, id: &QueryId) -> SessionHandle {
        let token = CancellationToken::new();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().expect("session registry poisoned");
        if let Some(previous) = entries.insert(
            id.clone(),
            Entry {
                token: token.clone(),
                generation,
            },
        ) {
            debug!("Replacing live session handle for {id}; cancelling the old one");
            previous.token.cancel();
        }
        SessionHandle { token, generation }
    }

    /// Signal cancellation for the id, if it is live.
    ///
    /// The entry itself is removed by the owning pipeline on exit, so a
    /// follow-up status poll sees the id as gone.
    pub fn cancel(&self, id: &QueryId) -> CancelOutcome {
        let entries = self.entries.lock().expect("session registry poisoned");
        match entries.get(id) {
            Some(entry) => {
                entry.token.cancel();
                CancelOutcome::Cancelled
            }
            None => CancelOutcome::NotFound,
        }
    }

    /// Remove the entry for the id, but only if it still belongs to the
    /// given handle. Returns whether the entry was removed — false means a
    /// newer invocation re-registered the id and owns it now.
    pub fn remove(&self, id: &QueryId, handle: &SessionHandle) -> bool {
        let mut entries = self.entries.lock().expect("session registry poisoned");
        match entries.get(id) {
            Some(entry) if entry.generation == handle.generation => {
                entries.remove(id);
                true
            }
            _ => false,
        }
    }

    pub fn is_live(&self, id: &QueryId) -> bool {
        self.entries
            .lock()
            .expect("session registry poisoned")
            .contains_key(id)
    }

    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .expect("session registry poisoned")
            .len()
    }
}
