use serde::Serialize;
use tally_core::{Money, PartyId, ScopeId};
use tally_ledger::DebtEntry;

/// One logical charge request, before resolution.
///
/// `participants` is the divisor of the even split: the distinct payee count
/// for an explicit mention list, or the number of eligible members excluding
/// the payer for an all-members charge. It travels separately from `payees`
/// because the roster decides it for all-members charges.
#[derive(Clone, Debug)]
pub struct ChargeRequest {
    pub scope: ScopeId,
    pub payer: PartyId,
    pub payees: Vec<PartyId>,
    pub total: Money,
    pub reason: Option<String>,
    pub participants: i64,
}

/// Result of resolving one charge request.
#[derive(Clone, Debug, Serialize)]
pub struct ChargeOutcome {
    /// Id shared by every entry written for this request; `None` when the
    /// request resolved to nothing (no eligible payees, or a share of zero).
    pub operation_id: Option<u64>,
    /// The per-payee portion after integer division.
    pub share: Money,
    pub entries: Vec<DebtEntry>,
}

impl ChargeOutcome {
    pub(crate) fn empty(share: Money) -> Self {
        Self {
            operation_id: None,
            share,
            entries: Vec::new(),
        }
    }
}

/// Order-preserving payee normalization: the payer and duplicates drop out.
pub fn normalize_payees(payer: &PartyId, payees: &[PartyId]) -> Vec<PartyId> {
    let mut normalized: Vec<PartyId> = Vec::with_capacity(payees.len());
    for payee in payees {
        if payee != payer && !normalized.contains(payee) {
            normalized.push(payee.clone());
        }
    }
    normalized
}
