use tally_core::{Money, PartyId, ScopeId};

use crate::{DebtEntry, EntryFilter, LedgerResult};

/// The entries sharing a scope's newest operation id.
#[derive(Clone, Debug)]
pub struct Operation {
    pub id: u64,
    /// The `from` party of the operation's entries; a charge writes one
    /// `from` across its whole fan-out, so any entry is representative.
    pub author: PartyId,
    /// In audit (insertion) order.
    pub entries: Vec<DebtEntry>,
}

/// Abstraction over the media a debt ledger can live on.
///
/// Implementations durably persist every mutation before returning success;
/// callers rely on read-after-write consistency within the process. Callers
/// also guarantee entry validity (`amount > 0`, `from != to`); the store
/// does not re-validate.
pub trait LedgerStore: Send + Sync {
    /// Persist one entry.
    fn append(&self, entry: &DebtEntry) -> LedgerResult<()> {
        self.append_operation(std::slice::from_ref(entry))
    }

    /// Persist every entry of one logical operation as a single atomic
    /// write. An empty batch is a no-op.
    fn append_operation(&self, entries: &[DebtEntry]) -> LedgerResult<()>;

    /// Sum of all amounts recorded from `from` towards `to` within `scope`.
    /// Zero when nothing matches, never an error.
    fn pair_sum(&self, scope: ScopeId, from: &PartyId, to: &PartyId) -> LedgerResult<Money>;

    /// Load entries matching `filter`, newest first unless asked otherwise.
    fn entries(&self, filter: &EntryFilter) -> LedgerResult<Vec<DebtEntry>>;

    /// The entries sharing the scope's maximum operation id.
    /// [`LedgerError::NotFound`](crate::LedgerError::NotFound) when the
    /// scope has no entries at all.
    fn latest_operation(&self, scope: ScopeId) -> LedgerResult<Operation>;

    /// Delete every entry of `(scope, operation_id)` atomically; returns
    /// the number removed. Zero removed is not an error.
    fn delete_operation(&self, scope: ScopeId, operation_id: u64) -> LedgerResult<usize>;

    /// Store-wide maximum operation id, `None` while the store is empty.
    /// Used to bootstrap the sequencer.
    fn latest_operation_id(&self) -> LedgerResult<Option<u64>>;
}
