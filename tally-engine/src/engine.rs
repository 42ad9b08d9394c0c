use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tally_core::{Money, PartyId, ScopeId};
use tally_ledger::{
    DebtEntry, EntryFilter, EntryKind, LedgerError, LedgerStore, OperationSequencer,
};
use tracing::info;

use crate::balance::{all_balances, balances_involving, net_balance, PairBalance};
use crate::charge::{normalize_payees, ChargeOutcome, ChargeRequest};
use crate::error::{EngineError, EngineResult};

/// Result of cancelling a scope's newest operation.
#[derive(Clone, Debug, Serialize)]
pub struct CancelOutcome {
    pub operation_id: u64,
    /// The entries that were removed, for the caller to render.
    pub removed: Vec<DebtEntry>,
}

/// Facade over one [`LedgerStore`]: charge resolution, cancellation and the
/// balance/history queries, invoked synchronously once per inbound request.
pub struct DebtEngine {
    store: Arc<dyn LedgerStore>,
    sequencer: OperationSequencer,
}

impl DebtEngine {
    /// Open an engine over `store`, resuming operation ids after the newest
    /// persisted one.
    pub fn new(store: Arc<dyn LedgerStore>) -> EngineResult<Self> {
        let sequencer = OperationSequencer::bootstrap(store.as_ref())?;
        Ok(Self { store, sequencer })
    }

    pub fn net_balance(&self, scope: ScopeId, a: &PartyId, b: &PartyId) -> EngineResult<Money> {
        net_balance(self.store.as_ref(), scope, a, b)
    }

    pub fn all_balances(&self, scope: ScopeId) -> EngineResult<Vec<PairBalance>> {
        all_balances(self.store.as_ref(), scope)
    }

    pub fn balances_involving(
        &self,
        scope: ScopeId,
        party: &PartyId,
    ) -> EngineResult<Vec<PairBalance>> {
        balances_involving(self.store.as_ref(), scope, party)
    }

    /// Resolve one charge request into ledger entries.
    ///
    /// Each payee's share is netted against the pair's existing balance:
    /// a payee the payer owes gets a return first, and only the excess (if
    /// any) becomes fresh debt. Everything written for one request shares
    /// one operation id and lands in a single atomic batch, so a storage
    /// failure leaves no partial fan-out behind.
    pub fn charge(&self, request: ChargeRequest) -> EngineResult<ChargeOutcome> {
        if request.participants <= 0 {
            return Err(EngineError::InvalidParticipants(request.participants));
        }
        let payees = normalize_payees(&request.payer, &request.payees);
        let share = request.total.split(request.participants);
        if payees.is_empty() || !share.is_positive() {
            return Ok(ChargeOutcome::empty(share));
        }

        let mut planned: Vec<(PartyId, EntryKind, Money)> = Vec::new();
        for payee in &payees {
            let net = self.net_balance(request.scope, &request.payer, payee)?;
            if net >= Money::ZERO {
                planned.push((payee.clone(), EntryKind::Debt, share));
            } else {
                let owed = net.abs();
                if share <= owed {
                    planned.push((payee.clone(), EntryKind::Return, share));
                } else {
                    planned.push((payee.clone(), EntryKind::Return, owed));
                    planned.push((payee.clone(), EntryKind::Debt, share - owed));
                }
            }
        }

        // The id is allocated strictly before any entry referencing it is
        // written, and only once at least one entry is guaranteed.
        let operation_id = self.sequencer.next();
        let created_at = Utc::now();
        let entries: Vec<DebtEntry> = planned
            .into_iter()
            .map(|(payee, kind, amount)| DebtEntry {
                scope: request.scope,
                from: request.payer.clone(),
                to: payee,
                amount,
                reason: request.reason.clone(),
                kind,
                operation_id,
                created_at,
            })
            .collect();
        self.store.append_operation(&entries)?;
        info!(
            scope = %request.scope,
            operation = operation_id,
            entries = entries.len(),
            "charge recorded"
        );
        Ok(ChargeOutcome {
            operation_id: Some(operation_id),
            share,
            entries,
        })
    }

    /// Cancel the scope's newest operation, if `requester` authored it.
    pub fn cancel(&self, scope: ScopeId, requester: &PartyId) -> EngineResult<CancelOutcome> {
        let operation = self.store.latest_operation(scope).map_err(|err| match err {
            LedgerError::NotFound => EngineError::NoOperations,
            other => EngineError::Ledger(other),
        })?;
        if operation.author != *requester {
            return Err(EngineError::NotAuthorized {
                author: operation.author,
            });
        }
        let removed = self.store.delete_operation(scope, operation.id)?;
        if removed == 0 {
            // The entries vanished between the lookup and the delete.
            return Err(EngineError::AlreadyCancelled);
        }
        info!(
            scope = %scope,
            operation = operation.id,
            removed,
            "operation cancelled"
        );
        Ok(CancelOutcome {
            operation_id: operation.id,
            removed: operation.entries,
        })
    }

    /// Entries from the last `days` days, newest first.
    pub fn history(&self, scope: ScopeId, days: i64) -> EngineResult<Vec<DebtEntry>> {
        let since = Utc::now() - Duration::days(days);
        let filter = EntryFilter::for_scope(scope).with_since(since);
        Ok(self.store.entries(&filter)?)
    }

    /// Every entry of the scope, newest first.
    pub fn entries(&self, scope: ScopeId) -> EngineResult<Vec<DebtEntry>> {
        Ok(self.store.entries(&EntryFilter::for_scope(scope))?)
    }
}
