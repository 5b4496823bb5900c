use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::errors::{FieldError, WarikanError};
use crate::core::models::user::AuthUser;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateAuthUserRequest {
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreateAuthUserResponse {
    pub auth_user: AuthUser,
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    #[schema(example = "Trip to Kyoto")]
    pub group_name: String,
    #[schema(example = "Alice")]
    pub host_name: String,
    pub participants_name: Vec<String>,
    #[schema(example = "JPY")]
    pub currency_code: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateGroupNameRequest {
    pub group_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct JoinGroupRequest {
    pub join_token: Uuid,
    pub user_uuid: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserNameRequest {
    pub name: String,
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Number of records to return, newest first
    pub count: Option<usize>,
}

#[derive(Deserialize, IntoParams)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldError>,
}

// Newtype wrapper for WarikanError to implement IntoResponse
pub struct ApiError(pub WarikanError);

impl From<WarikanError> for ApiError {
    fn from(err: WarikanError) -> Self {
        ApiError(err)
    }
}

pub fn status_code(err: &WarikanError) -> StatusCode {
    match err {
        WarikanError::InvalidInput(..)
        | WarikanError::MalformedRequest(_)
        | WarikanError::InvalidTransactionDetail(_)
        | WarikanError::ObligationSumMismatch { .. }
        | WarikanError::InvalidObligationCount { .. }
        | WarikanError::SelfRepayment
        | WarikanError::UnsupportedCurrency(_)
        | WarikanError::CurrencyMismatch { .. }
        | WarikanError::AmountOverflow
        | WarikanError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
        WarikanError::GroupNotFound(_)
        | WarikanError::UserNotFound(_)
        | WarikanError::AuthUserNotFound(_)
        | WarikanError::NotGroupMember(_)
        | WarikanError::TransactionNotFound(_) => StatusCode::NOT_FOUND,
        WarikanError::EmailAlreadyRegistered(_)
        | WarikanError::AlreadyJoined(_)
        | WarikanError::UserAlreadyLinked(_)
        | WarikanError::GroupLimitReached(_)
        | WarikanError::GroupFull(_) => StatusCode::CONFLICT,
        WarikanError::InvalidJoinToken | WarikanError::JoinTokenExpired | WarikanError::Forbidden(_) => {
            StatusCode::FORBIDDEN
        }
        WarikanError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        WarikanError::LedgerInvariant(_)
        | WarikanError::InternalServerError(_)
        | WarikanError::StorageError(_)
        | WarikanError::LoggingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = status_code(&self.0);
        let body = match self.0 {
            WarikanError::InvalidInput(_, details) => ErrorResponse {
                error: details.description.clone(),
                details: Some(details),
            },
            err if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("Request failed: {}", err);
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    details: None,
                }
            }
            err => ErrorResponse {
                error: err.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
