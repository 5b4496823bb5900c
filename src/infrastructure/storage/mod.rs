use crate::core::errors::WarikanError;
use crate::core::models::{
    group::Group,
    transaction::TransactionRecord,
    user::{AuthUser, User},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence seam for accounts, groups, participants and records.
///
/// Reads hand out owned snapshots. `list_transactions` returns a group's
/// records in insertion order as of a single point in time.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create_auth_user(&self, auth_user: AuthUser) -> Result<AuthUser, WarikanError>;
    async fn get_auth_user(&self, uid: &str) -> Result<Option<AuthUser>, WarikanError>;
    async fn save_auth_user(&self, auth_user: AuthUser) -> Result<(), WarikanError>;
    /// Unlinks every participant of the account, then removes it.
    async fn delete_auth_user(&self, uid: &str) -> Result<Option<AuthUser>, WarikanError>;

    async fn save_group(&self, group: Group) -> Result<(), WarikanError>;
    async fn get_group(&self, group_id: &Uuid) -> Result<Option<Group>, WarikanError>;
    async fn get_groups(&self, group_ids: &[Uuid]) -> Result<Vec<Group>, WarikanError>;

    async fn save_user(&self, user: User) -> Result<(), WarikanError>;
    async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, WarikanError>;
    async fn get_group_users(&self, group_id: &Uuid) -> Result<Vec<User>, WarikanError>;
    async fn get_users_by_auth_user(&self, uid: &str) -> Result<Vec<User>, WarikanError>;

    async fn append_transaction(&self, record: TransactionRecord) -> Result<(), WarikanError>;
    async fn get_transaction(&self, group_id: &Uuid, transaction_id: &Uuid)
    -> Result<Option<TransactionRecord>, WarikanError>;
    async fn list_transactions(&self, group_id: &Uuid) -> Result<Vec<TransactionRecord>, WarikanError>;
    async fn delete_transaction(&self, group_id: &Uuid, transaction_id: &Uuid) -> Result<bool, WarikanError>;
}

pub mod in_memory;
