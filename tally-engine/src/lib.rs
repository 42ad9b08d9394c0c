//! The ledger engine: turns charge requests into netted debt/return
//! entries, aggregates pairwise balances, and reverses whole operations.

mod balance;
mod charge;
mod engine;
mod error;

pub use balance::{all_balances, balances_involving, net_balance, PairBalance};
pub use charge::{normalize_payees, ChargeOutcome, ChargeRequest};
pub use engine::{CancelOutcome, DebtEngine};
pub use error::{EngineError, EngineResult};
