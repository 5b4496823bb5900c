use crate::auth::jwt::{Claims, JwtService};
use crate::constants::{
    AUTH_USER_DELETED, AUTH_USER_LOGGED_IN, AUTH_USER_REGISTERED, DEFAULT_HISTORY_COUNT, GROUP_CREATED, GROUP_RENAMED,
    JOIN_TOKEN_TTL_HOURS, MAX_GROUP_MEMBERS, MAX_GROUP_PARTICIPANTS, MAX_HISTORY_COUNT, MAX_LINKED_GROUPS,
    MAX_NAME_LENGTH, MEMBER_ADDED, MEMBER_JOINED, MEMBER_LEFT, SETTLEMENT_QUERIED, TRANSACTION_CREATED,
    TRANSACTION_DELETED, USER_RENAMED,
};
use crate::core::errors::WarikanError;
use crate::core::ledger::{Ledger, compute_balances};
use crate::core::models::{
    audit::AppLog,
    group::{Group, GroupDetails},
    settlement::{BalancesResponse, SettlementResponse, TransactionSettlement, UserBalance},
    transaction::{
        LoanView, NewTransaction, ObligationView, RepaymentView, TransactionDetail, TransactionRecord,
        TransactionView,
    },
    user::{AuthUser, User, UserInfo},
};
use crate::core::money::CurrencyCode;
use crate::core::recorder::validate_and_build;
use crate::core::settlement::compute_settlement;
use crate::core::validation::{validate_email, validate_string_input};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct WarikanService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    jwt_service: JwtService,
    default_currency: CurrencyCode,
    join_token_ttl: Duration,
    // Serializes read-modify-write sequences on groups and records.
    writes: Mutex<()>,
}

impl<L: LoggingService, S: Storage> WarikanService<L, S> {
    pub fn new(
        storage: S,
        logging: L,
        jwt_secret: String,
        token_ttl_secs: u64,
        default_currency: CurrencyCode,
    ) -> Self {
        WarikanService {
            storage,
            logging,
            jwt_service: JwtService::new(jwt_secret, token_ttl_secs),
            default_currency,
            join_token_ttl: Duration::hours(JOIN_TOKEN_TTL_HOURS),
            writes: Mutex::new(()),
        }
    }

    pub fn with_join_token_ttl(mut self, ttl: Duration) -> Self {
        self.join_token_ttl = ttl;
        self
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, WarikanError> {
        self.jwt_service.validate_token(token)
    }

    pub fn issue_token(&self, uid: &str) -> Result<String, WarikanError> {
        self.jwt_service.generate_token(uid)
    }

    /// Called once a write is stored, so a failing action log only warns.
    async fn log_action(&self, action: &str, details: serde_json::Value, uid: &str) {
        info!(action, uid, %details, "action recorded");
        if let Err(e) = self.logging.log_action(action, details, Some(uid)).await {
            warn!(action, uid, "failed to record action: {}", e);
        }
    }

    async fn load_group(&self, group_id: &Uuid) -> Result<Group, WarikanError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| WarikanError::GroupNotFound(group_id.to_string()))
    }

    async fn load_auth_user(&self, uid: &str) -> Result<AuthUser, WarikanError> {
        self.storage
            .get_auth_user(uid)
            .await?
            .ok_or_else(|| WarikanError::AuthUserNotFound(uid.to_string()))
    }

    async fn load_group_user(&self, group: &Group, user_id: &Uuid) -> Result<User, WarikanError> {
        if !group.has_member(user_id) {
            return Err(WarikanError::UserNotFound(user_id.to_string()));
        }
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| WarikanError::UserNotFound(user_id.to_string()))
    }

    async fn ensure_below_group_limit(&self, uid: &str) -> Result<(), WarikanError> {
        let linked = self.storage.get_users_by_auth_user(uid)
        .await?;
        if linked.len() >= MAX_LINKED_GROUPS {
            return Err(WarikanError::GroupLimitReached(MAX_LINKED_GROUPS));
        }
        Ok(())
    }

    // Auth users

    pub async fn register_auth_user(&self, name: &str, email: &str) -> Result<(AuthUser, String), WarikanError> {
        validate_string_input("name", name, MAX_NAME_LENGTH)?;
        validate_email(email)?;

        let now = Utc::now();
        let auth_user = self
            .storage
            .create_auth_user(AuthUser {
                uid: Uuid::new_v4().to_string(),
                name: name.trim().to_string(),
                email: email.to_string(),
                created_at: now,
                updated_at: now,
                last_login_time: now,
                total_login_count: 1,
            })
            .await?;
        let token = self.issue_token(&auth_user.uid)?;

        self.log_action(
            AUTH_USER_REGISTERED,
            json!({ "uid": auth_user.uid, "name": auth_user.name }),
            &auth_user.uid,
        )
        .await;
        Ok((auth_user, token))
    }

    /// Returns the account and records a login.
    pub async fn get_auth_user_info(&self, uid: &str) -> Result<AuthUser, WarikanError> {
        let mut auth_user = self.load_auth_user(uid).await?;
        auth_user.last_login_time = Utc::now();
        auth_user.total_login_count = auth_user.total_login_count.saturating_add(1);
        self.storage.save_auth_user(auth_user.clone()).await?;

        self.log_action(
            AUTH_USER_LOGGED_IN,
            json!({ "uid": uid, "total_login_count": auth_user.total_login_count }),
            uid,
        )
        .await;
        Ok(auth_user)
    }

    pub async fn delete_auth_user(&self, uid: &str) -> Result<(), WarikanError> {
        let _guard = self.writes.lock().await;
        self.storage
            .delete_auth_user(uid)
            .await?
            .ok_or_else(|| WarikanError::AuthUserNotFound(uid.to_string()))?;
        self.log_action(AUTH_USER_DELETED, json!({ "uid": uid }), uid).await;
        Ok(())
    }

    // Groups and participants

    pub async fn create_group(
        &self,
        uid: &str,
        group_name: &str,
        host_name: &str,
        participants_name: &[String],
        currency_code: Option<&str>,
    ) -> Result<GroupDetails, WarikanError> {
        validate_string_input("group_name", group_name, MAX_NAME_LENGTH)?;
        validate_string_input("host_name", host_name, MAX_NAME_LENGTH)?;
        if participants_name.is_empty() || participants_name.len() > MAX_GROUP_PARTICIPANTS {
            return Err(WarikanError::invalid_input(
                "participants_name",
                "Invalid participants_name",
                format!("A group needs between 1 and {} participants", MAX_GROUP_PARTICIPANTS),
            ));
        }
        for participant in participants_name {
            validate_string_input("participants_name", participant, MAX_NAME_LENGTH)?;
        }
        let currency = match currency_code {
            Some(code) => CurrencyCode::parse(code)?,
            None => self.default_currency.clone(),
        };

        let _guard = self.writes.lock().await;
        self.load_auth_user(uid).await?;
        self.ensure_below_group_limit(uid).await?;

        let now = Utc::now();
        let group_id = Uuid::new_v4();
        let mut users = vec![User::new(group_id, host_name.trim().to_string(), Some(uid.to_string()), now)];
        users.extend(
            participants_name
                .iter()
                .map(|name| User::new(group_id, name.trim().to_string(), None, now)),
        );

        let group = Group {
            id: group_id,
            name: group_name.trim().to_string(),
            join_token: Uuid::new_v4(),
            token_expires: now + self.join_token_ttl,
            currency_code: currency,
            member_ids: users.iter().map(|u| u.id).collect(),
            created_at: now,
            updated_at: now,
        };

        futures::future::try_join_all(users.iter().cloned().map(|user| self.storage.save_user(user))).await?;
        self.storage.save_group(group.clone()).await?;

        self.log_action(
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "currency_code": group.currency_code,
                "member_ids": group.member_ids,
            }),
            uid,
        )
        .await;

        Ok(GroupDetails {
            group,
            users,
            transaction_count: 0,
        })
    }

    pub async fn get_group_details(&self, group_id: &Uuid) -> Result<GroupDetails, WarikanError> {
        let group = self.load_group(group_id).await?;
        let (users, records) = futures::try_join!(
            self.storage.get_group_users(group_id),
            self.storage.list_transactions(group_id)
        )?;
        Ok(GroupDetails {
            group,
            users,
            transaction_count: records.len(),
        })
    }

    /// Groups the account is linked to, oldest link first.
    pub async fn list_groups(&self, uid: &str) -> Result<Vec<Group>, WarikanError> {
        let linked = self.storage.get_users_by_auth_user(uid).await?;
        let group_ids: Vec<Uuid> = linked.iter().map(|u| u.group_id).collect();
        self.storage.get_groups(&group_ids).await
    }

    pub async fn rename_group(&self, uid: &str, group_id: &Uuid, name: &str) -> Result<Group, WarikanError> {
        validate_string_input("group_name", name, MAX_NAME_LENGTH)?;
        let _guard = self.writes.lock().await;
        let mut group = self.load_group(group_id).await?;
        let previous = std::mem::replace(&mut group.name, name.trim().to_string());
        group.updated_at = Utc::now();
        self.storage.save_group(group.clone()).await?;

        self.log_action(
            GROUP_RENAMED,
            json!({ "group_id": group.id, "from": previous, "to": group.name }),
            uid,
        )
        .await;
        Ok(group)
    }

    pub async fn add_member(&self, uid: &str, group_id: &Uuid, name: &str) -> Result<User, WarikanError> {
        validate_string_input("name", name, MAX_NAME_LENGTH)?;
        let _guard = self.writes.lock().await;
        let mut group = self.load_group(group_id).await?;
        if group.member_ids.len() >= MAX_GROUP_MEMBERS {
            return Err(WarikanError::GroupFull(MAX_GROUP_MEMBERS));
        }

        let now = Utc::now();
        let user = User::new(group.id, name.trim().to_string(), None, now);
        group.member_ids.push(user.id);
        group.updated_at = now;
        self.storage.save_user(user.clone()).await?;
        self.storage.save_group(group).await?;

        self.log_action(
            MEMBER_ADDED,
            json!({ "group_id": group_id, "user_id": user.id, "name": user.name }),
            uid,
        )
        .await;
        Ok(user)
    }

    /// Links the caller's account to an unlinked participant of the group.
    pub async fn join_group(
        &self,
        uid: &str,
        group_id: &Uuid,
        join_token: &Uuid,
        user_id: &Uuid,
    ) -> Result<GroupDetails, WarikanError> {
        let guard = self.writes.lock().await;
        let group = self.load_group(group_id).await?;
        if group.join_token != *join_token {
            return Err(WarikanError::InvalidJoinToken);
        }
        if group.token_expires <= Utc::now() {
            return Err(WarikanError::JoinTokenExpired);
        }
        self.load_auth_user(uid).await?;

        let mut user = self.load_group_user(&group, user_id).await?;
        let linked = self.storage.get_users_by_auth_user(uid).await?;
        if linked.iter().any(|u| u.group_id == group.id) {
            return Err(WarikanError::AlreadyJoined(group.id.to_string()));
        }
        if user.auth_user_uid.is_some() {
            return Err(WarikanError::UserAlreadyLinked(user.id.to_string()));
        }
        if linked.len() >= MAX_LINKED_GROUPS {
            return Err(WarikanError::GroupLimitReached(MAX_LINKED_GROUPS));
        }

        user.auth_user_uid = Some(uid.to_string());
        user.updated_at = Utc::now();
        self.storage.save_user(user.clone()).await?;

        self.log_action(
            MEMBER_JOINED,
            json!({ "group_id": group.id, "user_id": user.id }),
            uid,
        )
        .await;
        drop(guard);
        self.get_group_details(group_id).await
    }

    /// Unlinks the caller's account from its participant. The participant
    /// and its records stay in the group.
    pub async fn leave_group(&self, uid: &str, group_id: &Uuid, user_id: &Uuid) -> Result<(), WarikanError> {
        let _guard = self.writes.lock().await;
        let group = self.load_group(group_id).await?;
        let mut user = self.load_group_user(&group, user_id).await?;
        if !user.is_linked_to(uid) {
            return Err(WarikanError::Forbidden(format!(
                "user {} is not linked to the caller",
                user_id
            )));
        }

        user.auth_user_uid = None;
        user.updated_at = Utc::now();
        self.storage.save_user(user).await?;

        self.log_action(MEMBER_LEFT, json!({ "group_id": group_id, "user_id": user_id }), uid).await;
        Ok(())
    }

    pub async fn rename_user(&self, uid: &str, user_id: &Uuid, name: &str) -> Result<User, WarikanError> {
        validate_string_input("name", name, MAX_NAME_LENGTH)?;
        let _guard = self.writes.lock().await;
        let mut user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| WarikanError::UserNotFound(user_id.to_string()))?;
        let previous = std::mem::replace(&mut user.name, name.trim().to_string());
        user.updated_at = Utc::now();
        self.storage.save_user(user.clone()).await?;

        self.log_action(
            USER_RENAMED,
            json!({ "user_id": user.id, "group_id": user.group_id, "from": previous, "to": user.name }),
            uid,
        )
        .await;
        Ok(user)
    }

    // Transactions

    pub async fn create_transaction(
        &self,
        uid: &str,
        group_id: &Uuid,
        request: &NewTransaction,
    ) -> Result<TransactionView, WarikanError> {
        let guard = self.writes.lock().await;
        let group = self.load_group(group_id).await?;
        let record = validate_and_build(&group, request, Utc::now())?;
        let mut ledger = Ledger::replay(&self.storage.list_transactions(group_id).await?)?;
        ledger.apply(&record)?;
        self.storage.append_transaction(record.clone()).await?;
        drop(guard);

        self.log_action(
            TRANSACTION_CREATED,
            json!({
                "group_id": group.id,
                "transaction_id": record.id,
                "transaction_type": record.transaction_type(),
                "amount": record.amount.amount(),
                "currency_code": record.amount.currency(),
            }),
            uid,
        )
        .await;

        let names = self.display_names(group_id).await?;
        to_view(&record, &names)
    }

    pub async fn get_transaction(&self, group_id: &Uuid, transaction_id: &Uuid) -> Result<TransactionView, WarikanError> {
        self.load_group(group_id).await?;
        let record = self
            .storage
            .get_transaction(group_id, transaction_id)
            .await?
            .ok_or_else(|| WarikanError::TransactionNotFound(transaction_id.to_string()))?;
        let names = self.display_names(group_id).await?;
        to_view(&record, &names)
    }

    pub async fn delete_transaction(&self, uid: &str, group_id: &Uuid, transaction_id: &Uuid) -> Result<(), WarikanError> {
        let guard = self.writes.lock().await;
        self.load_group(group_id).await?;
        let records = self.storage.list_transactions(group_id).await?;
        if !records.iter().any(|record| record.id == *transaction_id) {
            return Err(WarikanError::TransactionNotFound(transaction_id.to_string()));
        }
        // Removing a record can push a later running position out of range.
        let remaining: Vec<TransactionRecord> =
            records.into_iter().filter(|record| record.id != *transaction_id).collect();
        Ledger::replay(&remaining)?;

        if !self.storage.delete_transaction(group_id, transaction_id).await? {
            return Err(WarikanError::TransactionNotFound(transaction_id.to_string()));
        }
        drop(guard);

        self.log_action(
            TRANSACTION_DELETED,
            json!({ "group_id": group_id, "transaction_id": transaction_id }),
            uid,
        )
        .await;
        Ok(())
    }

    /// Most recent records first.
    pub async fn transaction_history(
        &self,
        group_id: &Uuid,
        count: Option<usize>,
    ) -> Result<Vec<TransactionView>, WarikanError> {
        let count = count.unwrap_or(DEFAULT_HISTORY_COUNT);
        if count == 0 || count > MAX_HISTORY_COUNT {
            return Err(WarikanError::invalid_input(
                "count",
                "Invalid count",
                format!("count must be between 1 and {}", MAX_HISTORY_COUNT),
            ));
        }
        self.load_group(group_id).await?;
        let (records, names) = futures::try_join!(
            self.storage.list_transactions(group_id),
            self.display_names(group_id)
        )?;
        records.iter().rev().take(count).map(|r| to_view(r, &names)).collect()
    }

    pub async fn group_balances(&self, group_id: &Uuid) -> Result<BalancesResponse, WarikanError> {
        let group = self.load_group(group_id).await?;
        let (records, users) = futures::try_join!(
            self.storage.list_transactions(group_id),
            self.storage.get_group_users(group_id)
        )?;
        let balances = compute_balances(&records).inspect_err(|e| error!(%group_id, "{}", e))?;

        Ok(BalancesResponse {
            currency_code: group.currency_code.to_string(),
            balances: users
                .iter()
                .map(|user| UserBalance {
                    user: user.info(),
                    amount: balances.get(&user.id).copied().unwrap_or(0),
                })
                .collect(),
        })
    }

    /// Recomputes balances from the full history and turns them into the
    /// smallest list of transfers.
    pub async fn settlement(&self, uid: &str, group_id: &Uuid) -> Result<SettlementResponse, WarikanError> {
        self.load_group(group_id).await?;
        let (records, names) = futures::try_join!(
            self.storage.list_transactions(group_id),
            self.display_names(group_id)
        )?;

        let edges = compute_balances(&records)
            .and_then(|balances| compute_settlement(&balances))
            .inspect_err(|e| error!(%group_id, "{}", e))?;

        let transactions_settlement = edges
            .iter()
            .map(|edge| {
                Ok(TransactionSettlement {
                    from: lookup(&names, &edge.from_user_id)?,
                    to: lookup(&names, &edge.to_user_id)?,
                    amount: edge.amount,
                })
            })
            .collect::<Result<Vec<_>, WarikanError>>()?;

        self.log_action(
            SETTLEMENT_QUERIED,
            json!({ "group_id": group_id, "records": records.len(), "transfers": transactions_settlement.len() }),
            uid,
        )
        .await;
        Ok(SettlementResponse { transactions_settlement })
    }

    pub async fn get_app_logs(&self, limit: Option<usize>) -> Result<Vec<AppLog>, WarikanError> {
        self.logging.get_logs(limit).await
    }

    async fn display_names(&self, group_id: &Uuid) -> Result<HashMap<Uuid, UserInfo>, WarikanError> {
        let users = self.storage.get_group_users(group_id).await?;
        Ok(users.into_iter().map(|u| (u.id, u.info())).collect())
    }
}

fn lookup(names: &HashMap<Uuid, UserInfo>, user_id: &Uuid) -> Result<UserInfo, WarikanError> {
    names
        .get(user_id)
        .cloned()
        .ok_or_else(|| WarikanError::InternalServerError(format!("no display name for user {}", user_id)))
}

fn to_view(record: &TransactionRecord, names: &HashMap<Uuid, UserInfo>) -> Result<TransactionView, WarikanError> {
    let (loan, repayment) = match &record.detail {
        TransactionDetail::Loan { obligations } => {
            let obligations = obligations
                .iter()
                .map(|o| {
                    Ok(ObligationView {
                        user: lookup(names, &o.user_id)?,
                        amount: o.amount,
                    })
                })
                .collect::<Result<Vec<_>, WarikanError>>()?;
            (Some(LoanView { obligations }), None)
        }
        TransactionDetail::Repayment { recipient_id } => (
            None,
            Some(RepaymentView {
                recipient: lookup(names, recipient_id)?,
            }),
        ),
    };

    Ok(TransactionView {
        transaction_id: record.id,
        transaction_type: record.transaction_type(),
        title: record.title.clone(),
        amount: record.amount.amount(),
        currency_code: record.amount.currency().to_string(),
        date_str: record.date.format("%Y-%m-%d").to_string(),
        payer: lookup(names, &record.payer_id)?,
        loan,
        repayment,
        created_at: record.created_at,
    })
}
