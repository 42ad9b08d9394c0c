use tally_core::PartyId;
use tally_ledger::LedgerError;
use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by engine operations. All of them are recoverable by the
/// caller; none are fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("participant count must be positive, got {0}")]
    InvalidParticipants(i64),
    #[error("no operations recorded for this scope")]
    NoOperations,
    #[error("only {author} may cancel this operation")]
    NotAuthorized { author: PartyId },
    #[error("the operation was already cancelled")]
    AlreadyCancelled,
}
