//! Append-only storage for directional debt entries.

mod entry;
mod error;
mod filter;
mod memory;
mod sequencer;
mod sqlite;
mod store;

pub use entry::{DebtEntry, EntryKind};
pub use error::{LedgerError, LedgerResult};
pub use filter::EntryFilter;
pub use memory::MemoryLedgerStore;
pub use sequencer::OperationSequencer;
pub use sqlite::SqliteLedgerStore;
pub use store::{LedgerStore, Operation};
