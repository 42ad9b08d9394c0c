use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::{Money, PartyId, ScopeId};

/// One directional obligation between two chat members.
///
/// Entries are immutable once written; the only mutation the store allows is
/// deleting every entry of one operation at once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebtEntry {
    pub scope: ScopeId,
    /// The party that is owed.
    pub from: PartyId,
    /// The party that owes.
    pub to: PartyId,
    /// Strictly positive; zero-amount entries are never stored.
    pub amount: Money,
    pub reason: Option<String>,
    pub kind: EntryKind,
    /// Shared by every entry created in one logical user action, strictly
    /// increasing across the whole store.
    pub operation_id: u64,
    pub created_at: DateTime<Utc>,
}

/// Bookkeeping label describing the intent behind an entry.
///
/// Aggregation ignores it entirely: the net balance between two parties is a
/// plain signed sum over entry directions, whatever the kinds involved.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// `to` owes `from`.
    Debt,
    /// `from` is repaying a prior debt to `to`.
    Return,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Debt => "debt",
            EntryKind::Return => "return",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debt" => Ok(EntryKind::Debt),
            "return" => Ok(EntryKind::Return),
            other => Err(format!("unknown entry kind: {other}")),
        }
    }
}
