use super::user::UserInfo;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One transfer of a settlement plan: `from_user_id` pays `to_user_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SettlementEdge {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransactionSettlement {
    pub from: UserInfo,
    pub to: UserInfo,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct SettlementResponse {
    pub transactions_settlement: Vec<TransactionSettlement>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserBalance {
    pub user: UserInfo,
    /// Positive when the group owes this user, negative when the user owes.
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct BalancesResponse {
    pub currency_code: String,
    pub balances: Vec<UserBalance>,
}
