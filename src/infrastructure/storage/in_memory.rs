use crate::core::errors::WarikanError;
use crate::core::models::{
    group::Group,
    transaction::TransactionRecord,
    user::{AuthUser, User},
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

// Locks are always taken in field order to avoid deadlocks.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    auth_users: Arc<RwLock<HashMap<String, AuthUser>>>,
    auth_users_by_email: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<Uuid, Group>>>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    transactions: Arc<RwLock<HashMap<Uuid, Vec<TransactionRecord>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_auth_user(&self, auth_user: AuthUser) -> Result<AuthUser, WarikanError> {
        let mut auth_users = self.auth_users.write().await;
        let mut by_email = self.auth_users_by_email.write().await;
        let email_key = auth_user.email.to_lowercase();
        if by_email.contains_key(&email_key) {
            return Err(WarikanError::EmailAlreadyRegistered(auth_user.email));
        }
        by_email.insert(email_key, auth_user.uid.clone());
        auth_users.insert(auth_user.uid.clone(), auth_user.clone());
        Ok(auth_user)
    }

    async fn get_auth_user(&self, uid: &str) -> Result<Option<AuthUser>, WarikanError> {
        let auth_users = self.auth_users.read().await;
        Ok(auth_users.get(uid).cloned())
    }

    async fn save_auth_user(&self, auth_user: AuthUser) -> Result<(), WarikanError> {
        let mut auth_users = self.auth_users.write().await;
        if !auth_users.contains_key(&auth_user.uid) {
            return Err(WarikanError::AuthUserNotFound(auth_user.uid));
        }
        auth_users.insert(auth_user.uid.clone(), auth_user);
        Ok(())
    }

    async fn delete_auth_user(&self, uid: &str) -> Result<Option<AuthUser>, WarikanError> {
        let mut auth_users = self.auth_users.write().await;
        let mut by_email = self.auth_users_by_email.write().await;
        let mut users = self.users.write().await;
        let Some(removed) = auth_users.remove(uid) else {
            return Ok(None);
        };
        by_email.remove(&removed.email.to_lowercase());
        for user in users.values_mut().filter(|u| u.is_linked_to(uid)) {
            user.auth_user_uid = None;
            user.updated_at = chrono::Utc::now();
        }
        Ok(Some(removed))
    }

    async fn save_group(&self, group: Group) -> Result<(), WarikanError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id, group);
        Ok(())
    }

    async fn get_group(&self, group_id: &Uuid) -> Result<Option<Group>, WarikanError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn get_groups(&self, group_ids: &[Uuid]) -> Result<Vec<Group>, WarikanError> {
        let groups = self.groups.read().await;
        Ok(group_ids.iter().filter_map(|id| groups.get(id).cloned()).collect())
    }

    async fn save_user(&self, user: User) -> Result<(), WarikanError> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, WarikanError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_group_users(&self, group_id: &Uuid) -> Result<Vec<User>, WarikanError> {
        let groups = self.groups.read().await;
        let users = self.users.read().await;
        let Some(group) = groups.get(group_id) else {
            return Ok(Vec::new());
        };
        Ok(group
            .member_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }

    async fn get_users_by_auth_user(&self, uid: &str) -> Result<Vec<User>, WarikanError> {
        let users = self.users.read().await;
        let mut linked: Vec<User> = users.values().filter(|u| u.is_linked_to(uid)).cloned().collect();
        linked.sort_by_key(|u| u.created_at);
        Ok(linked)
    }

    async fn append_transaction(&self, record: TransactionRecord) -> Result<(), WarikanError> {
        let mut transactions = self.transactions.write().await;
        transactions.entry(record.group_id).or_default().push(record);
        Ok(())
    }

    async fn get_transaction(
        &self,
        group_id: &Uuid,
        transaction_id: &Uuid,
    ) -> Result<Option<TransactionRecord>, WarikanError> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .get(group_id)
            .and_then(|records| records.iter().find(|r| r.id == *transaction_id))
            .cloned())
    }

    async fn list_transactions(&self, group_id: &Uuid) -> Result<Vec<TransactionRecord>, WarikanError> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(group_id).cloned().unwrap_or_default())
    }

    async fn delete_transaction(&self, group_id: &Uuid, transaction_id: &Uuid) -> Result<bool, WarikanError> {
        let mut transactions = self.transactions.write().await;
        let Some(records) = transactions.get_mut(group_id) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|r| r.id != *transaction_id);
        Ok(records.len() != before)
    }
}
