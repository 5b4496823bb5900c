use crate::{
    api::{models::*, openapi::ApiDoc},
    auth::jwt::Claims,
    core::{
        errors::WarikanError,
        models::{
            audit::AppLog,
            group::{Group, GroupDetails, GroupListResponse},
            settlement::{BalancesResponse, SettlementResponse},
            transaction::{NewTransaction, TransactionHistoryResponse, TransactionView},
            user::{AuthUser, User},
        },
        services::WarikanService,
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, patch, post},
};
use http::{Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub type AppState = Arc<WarikanService<InMemoryLogging, InMemoryStorage>>;

// Middleware to validate JWT
async fn auth_middleware(
    State(service): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| WarikanError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| WarikanError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// axum answers undecodable bodies with 422; clients get a 400 instead.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError(WarikanError::MalformedRequest(rejection.body_text())))
}

pub fn api_routes(service: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth-users/me", get(get_auth_user).delete(delete_auth_user))
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/{group_id}", get(get_group).patch(update_group_name))
        .route("/groups/{group_id}/members", post(add_member))
        .route("/groups/{group_id}/join", post(join_group))
        .route("/groups/{group_id}/users/{user_id}", axum::routing::delete(leave_group))
        .route("/users/{user_id}", patch(update_user_name))
        .route("/groups/{group_id}/transactions", post(create_transaction))
        .route("/groups/{group_id}/transactions/history", get(get_transaction_history))
        .route("/groups/{group_id}/transactions/settlement", get(get_settlement))
        .route(
            "/groups/{group_id}/transactions/{transaction_id}",
            get(get_transaction).delete(delete_transaction),
        )
        .route("/groups/{group_id}/balances", get(get_balances))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/auth-users", post(create_auth_user)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

/// Full application: routes, OpenAPI UI and the tower-http stack.
pub fn app_router(service: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes(service))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[utoipa::path(
    post,
    path = "/auth-users",
    request_body = CreateAuthUserRequest,
    responses(
        (status = 201, description = "Account created", body = CreateAuthUserResponse),
        (status = 400, description = "Invalid name or email", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn create_auth_user(
    State(service): State<AppState>,
    payload: Result<Json<CreateAuthUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateAuthUserResponse>), ApiError> {
    let req = json_body(payload)?;
    let (auth_user, token) = service.register_auth_user(&req.name, &req.email).await?;
    Ok((StatusCode::CREATED, Json(CreateAuthUserResponse { auth_user, token })))
}

#[utoipa::path(
    get,
    path = "/auth-users/me",
    responses(
        (status = 200, description = "Account of the caller; counts as a login", body = AuthUser),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_auth_user(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AuthUser>, ApiError> {
    let auth_user = service.get_auth_user_info(&claims.sub).await?;
    Ok(Json(auth_user))
}

#[utoipa::path(
    delete,
    path = "/auth-users/me",
    responses(
        (status = 204, description = "Account deleted and its participants unlinked"),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_auth_user(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    service.delete_auth_user(&claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created with the caller as host", body = GroupDetails),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Linked group limit reached", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_group(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GroupDetails>), ApiError> {
    let req = json_body(payload)?;
    let details = service
        .create_group(
            &claims.sub,
            &req.group_name,
            &req.host_name,
            &req.participants_name,
            req.currency_code.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/groups",
    responses((status = 200, description = "Groups the caller is linked to", body = GroupListResponse)),
    security(("Bearer" = []))
)]
async fn list_groups(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<GroupListResponse>, ApiError> {
    let groups = service.list_groups(&claims.sub).await?;
    Ok(Json(GroupListResponse { groups }))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Group with its participants", body = GroupDetails),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_group(
    State(service): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupDetails>, ApiError> {
    let details = service.get_group_details(&group_id).await?;
    Ok(Json(details))
}

#[utoipa::path(
    patch,
    path = "/groups/{group_id}",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    request_body = UpdateGroupNameRequest,
    responses(
        (status = 200, description = "Group renamed", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_group_name(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    payload: Result<Json<UpdateGroupNameRequest>, JsonRejection>,
) -> Result<Json<Group>, ApiError> {
    let req = json_body(payload)?;
    let group = service.rename_group(&claims.sub, &group_id, &req.group_name).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/members",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Participant added", body = User),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group is full", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_member(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    payload: Result<Json<AddMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let req = json_body(payload)?;
    let user = service.add_member(&claims.sub, &group_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/join",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    request_body = JoinGroupRequest,
    responses(
        (status = 200, description = "Caller linked to the participant", body = GroupDetails),
        (status = 403, description = "Join token invalid or expired", body = ErrorResponse),
        (status = 404, description = "Group or participant not found", body = ErrorResponse),
        (status = 409, description = "Already joined, participant taken or group limit reached", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn join_group(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    payload: Result<Json<JoinGroupRequest>, JsonRejection>,
) -> Result<Json<GroupDetails>, ApiError> {
    let req = json_body(payload)?;
    let details = service
        .join_group(&claims.sub, &group_id, &req.join_token, &req.user_uuid)
        .await?;
    Ok(Json(details))
}

#[utoipa::path(
    delete,
    path = "/groups/{group_id}/users/{user_id}",
    params(
        ("group_id" = Uuid, Path, description = "ID of the group"),
        ("user_id" = Uuid, Path, description = "Participant linked to the caller")
    ),
    responses(
        (status = 204, description = "Caller unlinked from the participant"),
        (status = 403, description = "Participant is not linked to the caller", body = ErrorResponse),
        (status = 404, description = "Group or participant not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn leave_group(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    service.leave_group(&claims.sub, &group_id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "ID of the participant")),
    request_body = UpdateUserNameRequest,
    responses(
        (status = 200, description = "Participant renamed", body = User),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Participant not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_user_name(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
    payload: Result<Json<UpdateUserNameRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let req = json_body(payload)?;
    let user = service.rename_user(&claims.sub, &user_id, &req.name).await?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/groups/{group_id}/transactions",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    request_body = NewTransaction,
    responses(
        (status = 201, description = "Transaction recorded", body = TransactionView),
        (status = 400, description = "Structural validation failed", body = ErrorResponse),
        (status = 404, description = "Group or user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_transaction(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    payload: Result<Json<NewTransaction>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionView>), ApiError> {
    let req = json_body(payload)?;
    let transaction = service.create_transaction(&claims.sub, &group_id, &req).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/transactions/history",
    params(
        ("group_id" = Uuid, Path, description = "ID of the group"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Most recent transactions first", body = TransactionHistoryResponse),
        (status = 400, description = "Invalid count", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_transaction_history(
    State(service): State<AppState>,
    Path(group_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<TransactionHistoryResponse>, ApiError> {
    let transactions_history = service.transaction_history(&group_id, query.count).await?;
    Ok(Json(TransactionHistoryResponse { transactions_history }))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/transactions/settlement",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Transfers that clear every balance", body = SettlementResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_settlement(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<SettlementResponse>, ApiError> {
    let settlement = service.settlement(&claims.sub, &group_id).await?;
    Ok(Json(settlement))
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/transactions/{transaction_id}",
    params(
        ("group_id" = Uuid, Path, description = "ID of the group"),
        ("transaction_id" = Uuid, Path, description = "ID of the transaction")
    ),
    responses(
        (status = 200, description = "Transaction detail", body = TransactionView),
        (status = 404, description = "Group or transaction not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_transaction(
    State(service): State<AppState>,
    Path((group_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TransactionView>, ApiError> {
    let transaction = service.get_transaction(&group_id, &transaction_id).await?;
    Ok(Json(transaction))
}

#[utoipa::path(
    delete,
    path = "/groups/{group_id}/transactions/{transaction_id}",
    params(
        ("group_id" = Uuid, Path, description = "ID of the group"),
        ("transaction_id" = Uuid, Path, description = "ID of the transaction")
    ),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 404, description = "Group or transaction not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_transaction(
    State(service): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    service.delete_transaction(&claims.sub, &group_id, &transaction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/groups/{group_id}/balances",
    params(("group_id" = Uuid, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Net position of every participant", body = BalancesResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_balances(
    State(service): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<BalancesResponse>, ApiError> {
    let balances = service.group_balances(&group_id).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/logs",
    params(LogsQuery),
    responses(
        (status = 200, description = "Application logs, newest first", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_app_logs(
    State(service): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs(query.limit).await?;
    Ok(Json(logs))
}
