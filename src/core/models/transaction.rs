use super::user::UserInfo;
use crate::core::money::Money;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Loan,
    Repayment,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionType::Loan => "LOAN",
            TransactionType::Repayment => "REPAYMENT",
        };
        write!(f, "{}", s)
    }
}

/// One obligee's share of a loan, in minor units of the record's currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Obligation {
    pub user_id: Uuid,
    pub amount: i64,
}

/// Shape-specific payload of a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionDetail {
    Loan { obligations: Vec<Obligation> },
    Repayment { recipient_id: Uuid },
}

/// Immutable fact describing one loan or repayment of a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub group_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub payer_id: Uuid,
    pub detail: TransactionDetail,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn transaction_type(&self) -> TransactionType {
        match self.detail {
            TransactionDetail::Loan { .. } => TransactionType::Loan,
            TransactionDetail::Repayment { .. } => TransactionType::Repayment,
        }
    }
}

// Request payload for creating a transaction. Every field is optional so that
// missing values surface as field-level validation errors.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct NewTransaction {
    pub transaction_type: Option<TransactionType>,
    #[schema(example = "Dinner")]
    pub title: Option<String>,
    #[schema(example = 5000)]
    pub amount: Option<i64>,
    #[schema(example = "JPY")]
    pub currency_code: Option<String>,
    #[schema(example = "2024-01-15")]
    pub date_str: Option<String>,
    pub payer_id: Option<Uuid>,
    pub loan: Option<LoanRequest>,
    pub repayment: Option<RepaymentRequest>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct LoanRequest {
    pub obligations: Option<Vec<ObligationRequest>>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ObligationRequest {
    #[schema(example = 2500)]
    pub amount: Option<i64>,
    pub user_uuid: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct RepaymentRequest {
    pub recipient_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ObligationView {
    pub user: UserInfo,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoanView {
    pub obligations: Vec<ObligationView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct RepaymentView {
    pub recipient: UserInfo,
}

/// Record rendered for clients, with user names resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransactionView {
    pub transaction_id: Uuid,
    pub transaction_type: TransactionType,
    pub title: String,
    pub amount: i64,
    pub currency_code: String,
    pub date_str: String,
    pub payer: UserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repayment: Option<RepaymentView>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TransactionHistoryResponse {
    pub transactions_history: Vec<TransactionView>,
}
