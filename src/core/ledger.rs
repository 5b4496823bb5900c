use crate::core::errors::WarikanError;
use crate::core::models::transaction::{TransactionDetail, TransactionRecord};
use crate::core::money::CurrencyCode;
use log::{debug, warn};
use std::collections::HashMap;
use uuid::Uuid;

/// Net position per user, in minor units. Positive means the group owes the
/// user; negative means the user owes the group.
pub type Balances = HashMap<Uuid, i64>;

/// Running net positions of a single group in a single currency.
///
/// Every applied record must keep the positions summing to zero. A violation
/// is reported as [`WarikanError::LedgerInvariant`] and points at a bug in
/// record validation rather than at client input. Positions that would leave
/// the `i64` range are [`WarikanError::AmountOverflow`].
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    currency: Option<CurrencyCode>,
    positions: Balances,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a ledger from already computed positions.
    pub fn from_balances(balances: &Balances) -> Result<Self, WarikanError> {
        let ledger = Self {
            currency: None,
            positions: balances.clone(),
        };
        ledger.ensure_balanced()?;
        Ok(ledger)
    }

    /// Replays records in order.
    pub fn replay(records: &[TransactionRecord]) -> Result<Self, WarikanError> {
        let mut ledger = Self::new();
        for record in records {
            ledger.apply(record)?;
        }
        Ok(ledger)
    }

    /// Applies one record. A position leaving the `i64` range is reported as
    /// [`WarikanError::AmountOverflow`] and leaves the ledger untouched.
    pub fn apply(&mut self, record: &TransactionRecord) -> Result<(), WarikanError> {
        let currency = record.amount.currency();
        if let Some(existing) = &self.currency {
            if existing != currency {
                return Err(WarikanError::LedgerInvariant(format!(
                    "record {} is in {} but the ledger is in {}",
                    record.id, currency, existing
                )));
            }
        }

        let amount = record.amount.amount();
        let staged = match &record.detail {
            TransactionDetail::Loan { obligations } => shifted(
                &self.positions,
                std::iter::once((record.payer_id, amount as i128))
                    .chain(obligations.iter().map(|o| (o.user_id, -(o.amount as i128)))),
            )?,
            TransactionDetail::Repayment { recipient_id } => shifted(
                &self.positions,
                [(record.payer_id, amount as i128), (*recipient_id, -(amount as i128))],
            )?,
        };

        ensure_zero_sum(&staged).inspect_err(|_| {
            warn!("Ledger out of balance after record {}", record.id);
        })?;
        self.positions = staged;
        self.currency.get_or_insert_with(|| currency.clone());
        debug!("Applied {} record {} for {}", record.transaction_type(), record.id, record.amount);
        Ok(())
    }

    /// Payer settles part of their debt: their position rises and the
    /// recipient's falls by the same amount.
    pub fn apply_repayment(&mut self, payer: Uuid, recipient: Uuid, amount: i64) -> Result<(), WarikanError> {
        self.positions = shifted(&self.positions, [(payer, amount as i128), (recipient, -(amount as i128))])?;
        Ok(())
    }

    pub fn position(&self, user_id: &Uuid) -> i64 {
        self.positions.get(user_id).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> &Balances {
        &self.positions
    }

    pub fn into_balances(self) -> Balances {
        self.positions
    }

    pub fn is_settled(&self) -> bool {
        self.positions.values().all(|amount| *amount == 0)
    }

    pub fn ensure_balanced(&self) -> Result<(), WarikanError> {
        ensure_zero_sum(&self.positions)
    }
}

fn ensure_zero_sum(positions: &Balances) -> Result<(), WarikanError> {
    let total: i128 = positions.values().map(|amount| *amount as i128).sum();
    if total != 0 {
        return Err(WarikanError::LedgerInvariant(format!(
            "positions sum to {} instead of zero",
            total
        )));
    }
    Ok(())
}

// Each user's deltas are netted first so only the resulting position has to
// fit in an i64.
fn shifted(positions: &Balances, deltas: impl IntoIterator<Item = (Uuid, i128)>) -> Result<Balances, WarikanError> {
    let mut net: HashMap<Uuid, i128> = HashMap::new();
    for (user_id, delta) in deltas {
        *net.entry(user_id).or_insert(0) += delta;
    }

    let mut staged = positions.clone();
    for (user_id, delta) in net {
        let current = staged.get(&user_id).copied().unwrap_or(0) as i128;
        let next = i64::try_from(current + delta).map_err(|_| WarikanError::AmountOverflow)?;
        staged.insert(user_id, next);
    }
    Ok(staged)
}

/// Folds a group's records, in order, into net positions.
pub fn compute_balances(records: &[TransactionRecord]) -> Result<Balances, WarikanError> {
    Ledger::replay(records).map(Ledger::into_balances)
}
