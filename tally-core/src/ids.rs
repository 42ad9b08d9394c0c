use std::fmt;

use serde::{Deserialize, Serialize};

/// Display name a chat member is addressed by. Balances are keyed by it;
/// there is no identity beyond the matching name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(name: impl Into<String>) -> Self {
        PartyId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(name: &str) -> Self {
        PartyId(name.to_owned())
    }
}

impl From<String> for PartyId {
    fn from(name: String) -> Self {
        PartyId(name)
    }
}

/// Chat the debts are tracked within. Balances never cross scopes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScopeId(i64);

impl ScopeId {
    pub fn new(id: i64) -> Self {
        ScopeId(id)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ScopeId {
    fn from(id: i64) -> Self {
        ScopeId(id)
    }
}
