use crate::core::errors::WarikanError;
use crate::core::ledger::{Balances, Ledger};
use crate::core::models::settlement::SettlementEdge;
use log::{debug, error};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use uuid::Uuid;

/// Party with a non-zero outstanding amount. The heap pops the largest
/// amount first; ties go to the smallest user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    remaining: u64,
    user_id: Reverse<Uuid>,
}

impl Outstanding {
    fn new(remaining: u64, user_id: Uuid) -> Self {
        Self {
            remaining,
            user_id: Reverse(user_id),
        }
    }

    fn id(&self) -> Uuid {
        self.user_id.0
    }
}

impl Ord for Outstanding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .cmp(&other.remaining)
            .then_with(|| self.user_id.cmp(&other.user_id))
    }
}

impl PartialOrd for Outstanding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Greedy debt simplification.
///
/// Matches the largest creditor against the largest debtor until one side is
/// exhausted. Output depends only on the contents of `balances`, never on map
/// iteration order, and holds at most `n - 1` edges for `n` non-zero parties.
pub fn compute_settlement(balances: &Balances) -> Result<Vec<SettlementEdge>, WarikanError> {
    Ledger::from_balances(balances)?;

    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    for (user_id, amount) in balances {
        match amount.cmp(&0) {
            Ordering::Greater => creditors.push(Outstanding::new(amount.unsigned_abs(), *user_id)),
            Ordering::Less => debtors.push(Outstanding::new(amount.unsigned_abs(), *user_id)),
            Ordering::Equal => {}
        }
    }
    let parties = creditors.len() + debtors.len();

    let mut edges = Vec::with_capacity(parties.saturating_sub(1));
    while let (Some(mut creditor), Some(mut debtor)) = (creditors.pop(), debtors.pop()) {
        let transfer = creditor.remaining.min(debtor.remaining);
        let amount = i64::try_from(transfer)
            .map_err(|_| WarikanError::LedgerInvariant(format!("transfer {} exceeds i64", transfer)))?;
        edges.push(SettlementEdge {
            from_user_id: debtor.id(),
            to_user_id: creditor.id(),
            amount,
        });

        creditor.remaining -= transfer;
        debtor.remaining -= transfer;
        if creditor.remaining > 0 {
            creditors.push(creditor);
        }
        if debtor.remaining > 0 {
            debtors.push(debtor);
        }
    }

    verify_settlement(balances, &edges, parties)?;
    debug!("Settled {} parties with {} transfers", parties, edges.len());
    Ok(edges)
}

/// Replays `edges` as repayments on top of `balances` and checks that every
/// position returns to zero.
fn verify_settlement(balances: &Balances, edges: &[SettlementEdge], parties: usize) -> Result<(), WarikanError> {
    if parties > 0 && edges.len() > parties - 1 {
        error!("Settlement produced {} edges for {} parties", edges.len(), parties);
        return Err(WarikanError::LedgerInvariant(format!(
            "{} edges for {} parties",
            edges.len(),
            parties
        )));
    }

    let mut ledger = Ledger::from_balances(balances)?;
    for edge in edges {
        if edge.amount <= 0 || edge.from_user_id == edge.to_user_id {
            return Err(WarikanError::LedgerInvariant(format!("invalid settlement edge {:?}", edge)));
        }
        ledger.apply_repayment(edge.from_user_id, edge.to_user_id, edge.amount)?;
    }
    if !ledger.is_settled() {
        error!("Settlement left residual positions: {:?}", ledger.balances());
        return Err(WarikanError::LedgerInvariant(
            "settlement does not clear every position".to_string(),
        ));
    }
    Ok(())
}
