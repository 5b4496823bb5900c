use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WarikanError {
    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Request body could not be decoded
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Loan/repayment detail block does not match the declared transaction type
    #[error("Invalid transaction detail: {0}")]
    InvalidTransactionDetail(String),

    /// Loan obligations do not add up to the transaction amount
    #[error("Obligations sum to {actual} but the transaction amount is {expected}")]
    ObligationSumMismatch { expected: i64, actual: i64 },

    /// Loan carries no obligations or more than the allowed number
    #[error("A loan needs between 1 and {max} obligations, got {count}")]
    InvalidObligationCount { count: usize, max: usize },

    /// Repayment recipient is the payer
    #[error("Payer cannot repay themselves")]
    SelfRepayment,

    #[error("Currency {0} is not supported")]
    UnsupportedCurrency(String),

    /// Amount currency differs from the group's settlement currency
    #[error("Currency {actual} does not match the group currency {expected}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Auth user {0} not found")]
    AuthUserNotFound(String),

    #[error("User {0} is not a member of this group")]
    NotGroupMember(String),

    #[error("Transaction {0} not found")]
    TransactionNotFound(String),

    #[error("Invalid join token")]
    InvalidJoinToken,

    #[error("Join token has expired")]
    JoinTokenExpired,

    /// The caller's account is already linked to a participant of the group
    #[error("Already joined group {0}")]
    AlreadyJoined(String),

    /// The participant is already linked to another account
    #[error("User {0} is already linked to an account")]
    UserAlreadyLinked(String),

    #[error("Cannot be linked to more than {0} groups")]
    GroupLimitReached(usize),

    #[error("Group cannot have more than {0} members")]
    GroupFull(usize),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Engine invariant broken; never caused by client input
    #[error("Ledger invariant violated: {0}")]
    LedgerInvariant(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl WarikanError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        WarikanError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.into(),
                description: description.into(),
            },
        )
    }

    pub fn missing_field(field: &str) -> Self {
        Self::invalid_input(field, format!("Missing {}", field), format!("{} is required", field))
    }
}
