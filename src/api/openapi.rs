use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        AddMemberRequest, CreateAuthUserRequest, CreateAuthUserResponse, CreateGroupRequest, ErrorResponse,
        HealthResponse, JoinGroupRequest, UpdateGroupNameRequest, UpdateUserNameRequest,
    },
    core::{
        errors::FieldError,
        models::{
            audit::AppLog,
            group::{Group, GroupDetails, GroupListResponse},
            settlement::{BalancesResponse, SettlementResponse, TransactionSettlement, UserBalance},
            transaction::{
                LoanRequest, LoanView, NewTransaction, ObligationRequest, ObligationView, RepaymentRequest,
                RepaymentView, TransactionHistoryResponse, TransactionType, TransactionView,
            },
            user::{AuthUser, User, UserInfo},
        },
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health,
        super::handlers::create_auth_user,
        super::handlers::get_auth_user,
        super::handlers::delete_auth_user,
        super::handlers::create_group,
        super::handlers::list_groups,
        super::handlers::get_group,
        super::handlers::update_group_name,
        super::handlers::add_member,
        super::handlers::join_group,
        super::handlers::leave_group,
        super::handlers::update_user_name,
        super::handlers::create_transaction,
        super::handlers::get_transaction_history,
        super::handlers::get_settlement,
        super::handlers::get_transaction,
        super::handlers::delete_transaction,
        super::handlers::get_balances,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateAuthUserRequest,
        CreateAuthUserResponse,
        CreateGroupRequest,
        UpdateGroupNameRequest,
        AddMemberRequest,
        JoinGroupRequest,
        UpdateUserNameRequest,
        HealthResponse,
        ErrorResponse,
        FieldError,
        AuthUser,
        User,
        UserInfo,
        Group,
        GroupDetails,
        GroupListResponse,
        TransactionType,
        NewTransaction,
        LoanRequest,
        ObligationRequest,
        RepaymentRequest,
        TransactionView,
        LoanView,
        ObligationView,
        RepaymentView,
        TransactionHistoryResponse,
        SettlementResponse,
        TransactionSettlement,
        BalancesResponse,
        UserBalance,
        AppLog
    )),
    modifiers(&SecurityAddon),
    info(
        title = "Warikan API",
        description = "API for recording shared expenses in small groups and settling them with few transfers",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
