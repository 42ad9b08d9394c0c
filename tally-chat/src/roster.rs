use tally_core::{PartyId, ScopeId};
use thiserror::Error;

/// Supplies the eligible participants of a scope for `@all` charges.
///
/// Real deployments back this with the chat platform's member list; the
/// engine only ever sees the resulting payees and count.
pub trait Roster: Send + Sync {
    fn members(&self, scope: ScopeId) -> Result<Vec<PartyId>, RosterError>;
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("participant roster unavailable: {0}")]
    Unavailable(String),
}

/// Fixed member list, the same for every scope. Enough for tests and for
/// the CLI, where the operator names the members explicitly.
#[derive(Clone, Debug, Default)]
pub struct StaticRoster {
    members: Vec<PartyId>,
}

impl StaticRoster {
    pub fn new(members: Vec<PartyId>) -> Self {
        Self { members }
    }
}

impl Roster for StaticRoster {
    fn members(&self, _scope: ScopeId) -> Result<Vec<PartyId>, RosterError> {
        Ok(self.members.clone())
    }
}
