use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use warikan::core::money::CurrencyCode;
use warikan::{AppState, InMemoryLogging, InMemoryStorage, WarikanService, app_router};

fn build() -> (AppState, Router) {
    let _ = env_logger::try_init();
    let service: AppState = Arc::new(WarikanService::new(
        InMemoryStorage::new(),
        InMemoryLogging::new(),
        "api-test-secret".to_string(),
        3600,
        CurrencyCode::parse("JPY").unwrap(),
    ));
    let app = app_router(service.clone(), Duration::from_secs(5));
    (service, app)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth-users",
        None,
        Some(json!({ "name": name, "email": format!("{}@example.com", name.to_lowercase()) })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

/// Returns (token, group id, [host, bob, carol] ids).
async fn group_with_three(app: &Router) -> (String, String, Vec<String>) {
    let token = register(app, "Alice").await;
    let (status, body) = send(
        app,
        "POST",
        "/groups",
        Some(&token),
        Some(json!({ "group_name": "Trip", "host_name": "Alice", "participants_name": ["Bob", "Carol"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["group"]["id"].as_str().unwrap().to_string();
    let users = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    (token, group_id, users)
}

#[tokio::test]
async fn health_is_public() {
    let (_, app) = build();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let (_, app) = build();
    let (status, _) = send(&app, "GET", "/groups", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/groups", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn loan_then_settlement_over_http() {
    let (_, app) = build();
    let (token, group_id, users) = group_with_three(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/groups/{}/transactions", group_id),
        Some(&token),
        Some(json!({
            "transaction_type": "LOAN",
            "title": "Dinner",
            "amount": 5000,
            "currency_code": "JPY",
            "date_str": "2024-01-15",
            "payer_id": users[0],
            "loan": { "obligations": [
                { "amount": 2500, "user_uuid": users[1] },
                { "amount": 2500, "user_uuid": users[2] }
            ] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["transaction_type"], "LOAN");
    assert_eq!(body["payer"]["name"], "Alice");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/groups/{}/transactions/settlement", group_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let transfers = body["transactions_settlement"].as_array().unwrap();
    assert_eq!(transfers.len(), 2);
    for transfer in transfers {
        assert_eq!(transfer["to"]["uuid"], users[0].as_str());
        assert_eq!(transfer["to"]["name"], "Alice");
        assert_eq!(transfer["amount"], 2500);
    }
}

#[tokio::test]
async fn empty_group_settles_to_an_empty_list() {
    let (_, app) = build();
    let (token, group_id, _) = group_with_three(&app).await;
    let (status, body) = send(
        &app,
        "GET",
        &format!("/groups/{}/transactions/settlement", group_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "transactions_settlement": [] }));
}

#[tokio::test]
async fn structural_errors_are_bad_requests() {
    let (_, app) = build();
    let (token, group_id, users) = group_with_three(&app).await;
    let uri = format!("/groups/{}/transactions", group_id);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({
            "transaction_type": "LOAN",
            "title": "Dinner",
            "amount": 5000,
            "currency_code": "JPY",
            "date_str": "2024-01-15",
            "payer_id": users[0],
            "loan": { "obligations": [
                { "amount": 2499, "user_uuid": users[1] },
                { "amount": 2500, "user_uuid": users[2] }
            ] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(&token),
        Some(json!({
            "transaction_type": "REPAYMENT",
            "amount": 100,
            "currency_code": "JPY",
            "date_str": "2024-01-15",
            "payer_id": users[0],
            "repayment": { "recipient_id": users[1] }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "title");

    let request = Request::builder()
        .method("POST")
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let details = send(&app, "GET", &format!("/groups/{}", group_id), Some(&token), None).await.1;
    assert_eq!(details["transaction_count"], 0);
}

#[tokio::test]
async fn unknown_group_and_outsider_are_not_found() {
    let (_, app) = build();
    let (token, group_id, users) = group_with_three(&app).await;

    let (status, _) = send(
        &app,
        "GET",
        "/groups/00000000-0000-0000-0000-000000000000/transactions/settlement",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/groups/{}/transactions", group_id),
        Some(&token),
        Some(json!({
            "transaction_type": "REPAYMENT",
            "title": "Pay back",
            "amount": 100,
            "currency_code": "JPY",
            "date_str": "2024-01-15",
            "payer_id": users[0],
            "repayment": { "recipient_id": "00000000-0000-0000-0000-000000000001" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn join_and_leave_over_http() {
    let (_, app) = build();
    let (alice, group_id, users) = group_with_three(&app).await;
    let bob = register(&app, "Bob").await;

    let (_, details) = send(&app, "GET", &format!("/groups/{}", group_id), Some(&alice), None).await;
    let join_token = details["group"]["join_token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/groups/{}/join", group_id),
        Some(&bob),
        Some(json!({ "join_token": "00000000-0000-0000-0000-000000000000", "user_uuid": users[1] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/groups/{}/join", group_id),
        Some(&bob),
        Some(json!({ "join_token": join_token, "user_uuid": users[1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/groups", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groups"][0]["id"], group_id.as_str());

    // Bob cannot unlink Alice.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/groups/{}/users/{}", group_id, users[0]),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/groups/{}/users/{}", group_id, users[1]),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn auth_user_info_counts_logins() {
    let (service, app) = build();
    let token = register(&app, "Alice").await;
    let uid = service.validate_token(&token).unwrap().sub;

    let (status, body) = send(&app, "GET", "/auth-users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], uid.as_str());
    assert_eq!(body["total_login_count"], 2);

    let (status, _) = send(&app, "DELETE", "/auth-users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/auth-users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
