use std::collections::BTreeMap;

use serde::Serialize;
use tally_core::{Money, PartyId, ScopeId};
use tally_ledger::{EntryFilter, LedgerStore};

use crate::EngineResult;

/// One non-zero netted pair: `debtor` owes `creditor` `amount`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PairBalance {
    pub debtor: PartyId,
    pub creditor: PartyId,
    pub amount: Money,
}

/// Signed aggregate obligation between `a` and `b`. Positive means `b` owes
/// `a`; `net_balance(s, a, b) == -net_balance(s, b, a)` by construction.
pub fn net_balance(
    store: &dyn LedgerStore,
    scope: ScopeId,
    a: &PartyId,
    b: &PartyId,
) -> EngineResult<Money> {
    Ok(store.pair_sum(scope, a, b)? - store.pair_sum(scope, b, a)?)
}

/// Every non-zero pairwise balance in the scope, each unordered pair exactly
/// once with the positive direction deciding who owes whom.
///
/// The output is sorted by debtor then creditor, so a fixed entry set yields
/// a fixed result whatever order the entries arrived in.
pub fn all_balances(store: &dyn LedgerStore, scope: ScopeId) -> EngineResult<Vec<PairBalance>> {
    let entries = store.entries(&EntryFilter::for_scope(scope))?;
    // Net per unordered pair, keyed with the lexicographically smaller name
    // first; positive means the second party owes the first.
    let mut nets: BTreeMap<(PartyId, PartyId), i64> = BTreeMap::new();
    for entry in &entries {
        let (key, signed) = if entry.from <= entry.to {
            ((entry.from.clone(), entry.to.clone()), entry.amount.minor())
        } else {
            ((entry.to.clone(), entry.from.clone()), -entry.amount.minor())
        };
        *nets.entry(key).or_insert(0) += signed;
    }

    let mut balances = Vec::new();
    for ((first, second), net) in nets {
        if net > 0 {
            balances.push(PairBalance {
                debtor: second,
                creditor: first,
                amount: Money::from_minor(net),
            });
        } else if net < 0 {
            balances.push(PairBalance {
                debtor: first,
                creditor: second,
                amount: Money::from_minor(-net),
            });
        }
    }
    balances.sort_by(|a, b| {
        a.debtor
            .cmp(&b.debtor)
            .then_with(|| a.creditor.cmp(&b.creditor))
    });
    Ok(balances)
}

/// The subset of [`all_balances`] involving `party`.
pub fn balances_involving(
    store: &dyn LedgerStore,
    scope: ScopeId,
    party: &PartyId,
) -> EngineResult<Vec<PairBalance>> {
    let mut balances = all_balances(store, scope)?;
    balances.retain(|balance| balance.debtor == *party || balance.creditor == *party);
    Ok(balances)
}
