use parking_lot::RwLock;
use tally_core::{Money, PartyId, ScopeId};

use crate::{DebtEntry, EntryFilter, LedgerError, LedgerResult, LedgerStore, Operation};

/// In-memory store for tests and ephemeral runs.
///
/// Observable behavior matches [`SqliteLedgerStore`](crate::SqliteLedgerStore):
/// same ordering, same `NotFound` cases, same idempotent deletes. The lock
/// gives the same one-writer-at-a-time visibility the SQLite file lock does.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    entries: RwLock<Vec<DebtEntry>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn append_operation(&self, entries: &[DebtEntry]) -> LedgerResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.entries.write().extend_from_slice(entries);
        Ok(())
    }

    fn pair_sum(&self, scope: ScopeId, from: &PartyId, to: &PartyId) -> LedgerResult<Money> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .filter(|entry| entry.scope == scope && entry.from == *from && entry.to == *to)
            .map(|entry| entry.amount)
            .sum())
    }

    fn entries(&self, filter: &EntryFilter) -> LedgerResult<Vec<DebtEntry>> {
        let entries = self.entries.read();
        // Insertion index stands in for the audit row id when timestamps tie.
        let mut selected: Vec<(usize, DebtEntry)> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.scope == filter.scope)
            .filter(|(_, entry)| {
                filter
                    .since
                    .map_or(true, |since| entry.created_at >= since)
            })
            .map(|(index, entry)| (index, entry.clone()))
            .collect();
        selected.sort_by_key(|(index, entry)| (entry.created_at, *index));
        if !filter.ascending {
            selected.reverse();
        }
        let mut result: Vec<DebtEntry> = selected.into_iter().map(|(_, entry)| entry).collect();
        if let Some(limit) = filter.limit {
            result.truncate(limit);
        }
        Ok(result)
    }

    fn latest_operation(&self, scope: ScopeId) -> LedgerResult<Operation> {
        let entries = self.entries.read();
        let id = entries
            .iter()
            .filter(|entry| entry.scope == scope)
            .map(|entry| entry.operation_id)
            .max()
            .ok_or(LedgerError::NotFound)?;
        let operation_entries: Vec<DebtEntry> = entries
            .iter()
            .filter(|entry| entry.scope == scope && entry.operation_id == id)
            .cloned()
            .collect();
        let author = operation_entries
            .first()
            .map(|entry| entry.from.clone())
            .ok_or(LedgerError::NotFound)?;
        Ok(Operation {
            id,
            author,
            entries: operation_entries,
        })
    }

    fn delete_operation(&self, scope: ScopeId, operation_id: u64) -> LedgerResult<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| !(entry.scope == scope && entry.operation_id == operation_id));
        Ok(before - entries.len())
    }

    fn latest_operation_id(&self) -> LedgerResult<Option<u64>> {
        let entries = self.entries.read();
        Ok(entries.iter().map(|entry| entry.operation_id).max())
    }
}
