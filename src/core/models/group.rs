use super::user::User;
use crate::core::money::CurrencyCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub join_token: Uuid,
    pub token_expires: DateTime<Utc>,
    pub currency_code: CurrencyCode,
    /// Participants in the order they were added; the host comes first.
    pub member_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn has_member(&self, user_id: &Uuid) -> bool {
        self.member_ids.contains(user_id)
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GroupDetails {
    pub group: Group,
    pub users: Vec<User>,
    pub transaction_count: usize,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
}
