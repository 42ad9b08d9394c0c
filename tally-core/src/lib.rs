//! Shared value types used across the tally workspace.

mod ids;
mod money;

pub use ids::{PartyId, ScopeId};
pub use money::{Money, MoneyError, DEFAULT_FRACTION_DIGITS};
