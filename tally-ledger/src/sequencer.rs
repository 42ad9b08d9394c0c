use std::sync::atomic::{AtomicU64, Ordering};

use crate::{LedgerResult, LedgerStore};

/// Allocates the monotonic operation ids shared by all entries of one
/// logical action.
///
/// An id is handed out strictly before any entry referencing it is written,
/// so a concurrent cancellation can never race an append of the same id.
#[derive(Debug)]
pub struct OperationSequencer {
    last: AtomicU64,
}

impl OperationSequencer {
    /// Create a sequencer that continues after `last_id`.
    pub fn new(last_id: u64) -> Self {
        Self {
            last: AtomicU64::new(last_id),
        }
    }

    /// Resume after the newest id already persisted in `store`.
    pub fn bootstrap(store: &dyn LedgerStore) -> LedgerResult<Self> {
        let last = store.latest_operation_id()?.unwrap_or(0);
        Ok(Self::new(last))
    }

    /// Next operation id; monotonic under concurrent callers.
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }
}
