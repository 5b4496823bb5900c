use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A participant of exactly one group. It may be linked to an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub group_id: Uuid,
    pub name: String,
    pub auth_user_uid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(group_id: Uuid, name: String, auth_user_uid: Option<String>, now: DateTime<Utc>) -> Self {
        User {
            id: Uuid::new_v4(),
            group_id,
            name,
            auth_user_uid,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_linked_to(&self, uid: &str) -> bool {
        self.auth_user_uid.as_deref() == Some(uid)
    }

    pub fn info(&self) -> UserInfo {
        UserInfo {
            uuid: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub uuid: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_time: DateTime<Utc>,
    pub total_login_count: u32,
}
