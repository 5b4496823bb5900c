use crate::constants::{MAX_OBLIGATIONS, MAX_TITLE_LENGTH};
use crate::core::errors::WarikanError;
use crate::core::models::group::Group;
use crate::core::models::transaction::{
    NewTransaction, Obligation, TransactionDetail, TransactionRecord, TransactionType,
};
use crate::core::money::{CurrencyCode, Money};
use crate::core::validation::{validate_positive_amount, validate_string_input};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use uuid::Uuid;

/// What the recorder needs to know about the target group.
pub trait GroupMembership {
    fn group_id(&self) -> Uuid;
    fn is_member(&self, user_id: &Uuid) -> bool;
    fn settlement_currency(&self) -> &CurrencyCode;
}

impl GroupMembership for Group {
    fn group_id(&self) -> Uuid {
        self.id
    }

    fn is_member(&self, user_id: &Uuid) -> bool {
        self.has_member(user_id)
    }

    fn settlement_currency(&self) -> &CurrencyCode {
        &self.currency_code
    }
}

/// Checks a transaction request and turns it into a record.
///
/// Structural checks run first and report 400-class errors. Membership of
/// payer, obligees and recipient is checked only once the shape is valid.
pub fn validate_and_build<M: GroupMembership>(
    membership: &M,
    request: &NewTransaction,
    now: DateTime<Utc>,
) -> Result<TransactionRecord, WarikanError> {
    let transaction_type = request
        .transaction_type
        .ok_or_else(|| WarikanError::missing_field("transaction_type"))?;

    let title = request.title.as_deref().ok_or_else(|| WarikanError::missing_field("title"))?;
    validate_string_input("title", title, MAX_TITLE_LENGTH)?;

    let amount = request.amount.ok_or_else(|| WarikanError::missing_field("amount"))?;
    validate_positive_amount("amount", amount)?;

    let code = request
        .currency_code
        .as_deref()
        .ok_or_else(|| WarikanError::missing_field("currency_code"))?;
    let currency = CurrencyCode::parse(code)?;
    if &currency != membership.settlement_currency() {
        return Err(WarikanError::CurrencyMismatch {
            expected: membership.settlement_currency().to_string(),
            actual: currency.to_string(),
        });
    }

    let date_str = request.date_str.as_deref().ok_or_else(|| WarikanError::missing_field("date_str"))?;
    let date = parse_transaction_date(date_str)?;

    let payer_id = request.payer_id.ok_or_else(|| WarikanError::missing_field("payer_id"))?;

    let detail = build_detail(transaction_type, request, amount)?;

    if !membership.is_member(&payer_id) {
        return Err(WarikanError::NotGroupMember(payer_id.to_string()));
    }
    match &detail {
        TransactionDetail::Loan { obligations } => {
            if let Some(outsider) = obligations.iter().find(|o| !membership.is_member(&o.user_id)) {
                return Err(WarikanError::NotGroupMember(outsider.user_id.to_string()));
            }
        }
        TransactionDetail::Repayment { recipient_id } => {
            if !membership.is_member(recipient_id) {
                return Err(WarikanError::NotGroupMember(recipient_id.to_string()));
            }
        }
    }

    let record = TransactionRecord {
        id: Uuid::new_v4(),
        group_id: membership.group_id(),
        title: title.trim().to_string(),
        date,
        amount: Money::new(amount, currency),
        payer_id,
        detail,
        created_at: now,
    };
    debug!("Validated {} record {} for group {}", transaction_type, record.id, record.group_id);
    Ok(record)
}

fn build_detail(
    transaction_type: TransactionType,
    request: &NewTransaction,
    amount: i64,
) -> Result<TransactionDetail, WarikanError> {
    match (transaction_type, &request.loan, &request.repayment) {
        (TransactionType::Loan, Some(loan), None) => {
            let requested = loan
                .obligations
                .as_ref()
                .ok_or_else(|| WarikanError::missing_field("loan.obligations"))?;
            if requested.is_empty() || requested.len() > MAX_OBLIGATIONS {
                return Err(WarikanError::InvalidObligationCount {
                    count: requested.len(),
                    max: MAX_OBLIGATIONS,
                });
            }

            let mut obligations = Vec::with_capacity(requested.len());
            let mut total: i64 = 0;
            for item in requested {
                let share = item
                    .amount
                    .ok_or_else(|| WarikanError::missing_field("loan.obligations.amount"))?;
                validate_positive_amount("loan.obligations.amount", share)?;
                let user_id = item
                    .user_uuid
                    .ok_or_else(|| WarikanError::missing_field("loan.obligations.user_uuid"))?;
                total = total.checked_add(share).ok_or(WarikanError::AmountOverflow)?;
                obligations.push(Obligation { user_id, amount: share });
            }
            if total != amount {
                return Err(WarikanError::ObligationSumMismatch {
                    expected: amount,
                    actual: total,
                });
            }
            Ok(TransactionDetail::Loan { obligations })
        }
        (TransactionType::Repayment, None, Some(repayment)) => {
            let recipient_id = repayment
                .recipient_id
                .ok_or_else(|| WarikanError::missing_field("repayment.recipient_id"))?;
            if Some(recipient_id) == request.payer_id {
                return Err(WarikanError::SelfRepayment);
            }
            Ok(TransactionDetail::Repayment { recipient_id })
        }
        (TransactionType::Loan, _, _) => Err(WarikanError::InvalidTransactionDetail(
            "a LOAN needs a loan block and no repayment block".to_string(),
        )),
        (TransactionType::Repayment, _, _) => Err(WarikanError::InvalidTransactionDetail(
            "a REPAYMENT needs a repayment block and no loan block".to_string(),
        )),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is reduced to its
/// UTC date.
pub fn parse_transaction_date(value: &str) -> Result<NaiveDate, WarikanError> {
    let invalid = || {
        WarikanError::invalid_input(
            "date_str",
            "Invalid date_str",
            "Date must be YYYY-MM-DD or an RFC 3339 timestamp",
        )
    };
    if value.len() == 10 {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| invalid())
}
