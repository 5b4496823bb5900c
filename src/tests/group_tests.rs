use super::{create_group, create_test_service, register};
use crate::constants::{GROUP_CREATED, MAX_GROUP_MEMBERS, MAX_LINKED_GROUPS, MEMBER_JOINED};
use crate::core::errors::WarikanError;
use chrono::{Duration, Utc};
use uuid::Uuid;

#[tokio::test]
async fn test_create_group_links_the_host_to_the_caller() {
    let service = create_test_service();
    let uid = register(&service, "Alice").await;

    let details = create_group(&service, &uid, &["Bob", "Carol"]).await;

    assert_eq!(details.group.name, "Trip");
    assert_eq!(details.group.currency_code.as_str(), "JPY");
    assert_eq!(details.users.len(), 3);
    assert_eq!(details.group.member_ids[0], details.users[0].id);
    assert!(details.users[0].is_linked_to(&uid));
    assert!(details.users[1..].iter().all(|u| u.auth_user_uid.is_none()));
    assert!(details.group.token_expires > Utc::now());

    let logs = service.get_app_logs(None).await.unwrap();
    assert_eq!(logs[0].action, GROUP_CREATED);
}

#[tokio::test]
async fn test_create_group_validates_names_and_currency() {
    let service = create_test_service();
    let uid = register(&service, "Alice").await;

    let result = service.create_group(&uid, "Trip", "Host", &[], None).await;
    assert!(matches!(result, Err(WarikanError::InvalidInput(field, _)) if field == "participants_name"));

    let too_many: Vec<String> = (0..10).map(|i| format!("P{}", i)).collect();
    let result = service.create_group(&uid, "Trip", "Host", &too_many, None).await;
    assert!(matches!(result, Err(WarikanError::InvalidInput(..))));

    let long_name = "x".repeat(51);
    let result = service
        .create_group(&uid, &long_name, "Host", &["Bob".to_string()], None)
        .await;
    assert!(matches!(result, Err(WarikanError::InvalidInput(field, _)) if field == "group_name"));

    let result = service
        .create_group(&uid, "Trip", "Host", &["Bob".to_string()], Some("XYZ"))
        .await;
    assert!(matches!(result, Err(WarikanError::UnsupportedCurrency(_))));

    let details = service
        .create_group(&uid, "Trip", "Host", &["Bob".to_string()], Some("USD"))
        .await
        .unwrap();
    assert_eq!(details.group.currency_code.as_str(), "USD");
}

#[tokio::test]
async fn test_account_cannot_be_linked_to_more_than_nine_groups() {
    let service = create_test_service();
    let uid = register(&service, "Alice").await;
    for _ in 0..MAX_LINKED_GROUPS {
        create_group(&service, &uid, &["Bob"]).await;
    }
    assert_eq!(service.list_groups(&uid).await.unwrap().len(), MAX_LINKED_GROUPS);

    let result = service
        .create_group(&uid, "Trip", "Host", &["Bob".to_string()], None)
        .await;
    assert_eq!(result.unwrap_err(), WarikanError::GroupLimitReached(MAX_LINKED_GROUPS));
}

#[tokio::test]
async fn test_create_group_requires_a_registered_account() {
    let service = create_test_service();
    let result = service
        .create_group("ghost", "Trip", "Host", &["Bob".to_string()], None)
        .await;
    assert!(matches!(result, Err(WarikanError::AuthUserNotFound(_))));
}

#[tokio::test]
async fn test_rename_group_and_participant() {
    let service = create_test_service();
    let uid = register(&service, "Alice").await;
    let details = create_group(&service, &uid, &["Bob"]).await;

    let group = service.rename_group(&uid, &details.group.id, "Kyoto").await.unwrap();
    assert_eq!(group.name, "Kyoto");

    let bob = service.rename_user(&uid, &details.users[1].id, "Robert").await.unwrap();
    assert_eq!(bob.name, "Robert");

    let result = service.rename_group(&uid, &Uuid::new_v4(), "Kyoto").await;
    assert!(matches!(result, Err(WarikanError::GroupNotFound(_))));
    let result = service.rename_user(&uid, &Uuid::new_v4(), "Robert").await;
    assert!(matches!(result, Err(WarikanError::UserNotFound(_))));
}

#[tokio::test]
async fn test_add_member_until_the_group_is_full() {
    let service = create_test_service();
    let uid = register(&service, "Alice").await;
    let details = create_group(&service, &uid, &["Bob"]).await;

    for i in details.users.len()..MAX_GROUP_MEMBERS {
        service
            .add_member(&uid, &details.group.id, &format!("Member {}", i))
            .await
            .unwrap();
    }
    let result = service.add_member(&uid, &details.group.id, "One too many").await;
    assert_eq!(result.unwrap_err(), WarikanError::GroupFull(MAX_GROUP_MEMBERS));

    let details = service.get_group_details(&details.group.id).await.unwrap();
    assert_eq!(details.users.len(), MAX_GROUP_MEMBERS);
}

#[tokio::test]
async fn test_join_links_the_caller_to_an_unlinked_participant() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let details = create_group(&service, &alice, &["Bob", "Carol"]).await;
    let (group, bob_user) = (details.group.clone(), details.users[1].clone());

    let joined = service
        .join_group(&bob, &group.id, &group.join_token, &bob_user.id)
        .await
        .unwrap();
    assert!(joined.users[1].is_linked_to(&bob));
    assert_eq!(service.list_groups(&bob).await.unwrap()[0].id, group.id);

    let logs = service.get_app_logs(Some(1)).await.unwrap();
    assert_eq!(logs[0].action, MEMBER_JOINED);

    // The same account cannot take a second seat.
    let carol_user = details.users[2].clone();
    let result = service.join_group(&bob, &group.id, &group.join_token, &carol_user.id).await;
    assert!(matches!(result, Err(WarikanError::AlreadyJoined(_))));
}

#[tokio::test]
async fn test_join_rejects_bad_tokens_and_taken_participants() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let details = create_group(&service, &alice, &["Bob"]).await;
    let group = details.group.clone();

    let result = service
        .join_group(&bob, &group.id, &Uuid::new_v4(), &details.users[1].id)
        .await;
    assert_eq!(result.unwrap_err(), WarikanError::InvalidJoinToken);

    let result = service
        .join_group(&bob, &group.id, &group.join_token, &details.users[0].id)
        .await;
    assert!(matches!(result, Err(WarikanError::UserAlreadyLinked(_))));

    let result = service
        .join_group(&bob, &group.id, &group.join_token, &Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(WarikanError::UserNotFound(_))));
}

#[tokio::test]
async fn test_join_token_expires() {
    let service = create_test_service().with_join_token_ttl(Duration::seconds(-1));
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let details = create_group(&service, &alice, &["Bob"]).await;

    let result = service
        .join_group(&bob, &details.group.id, &details.group.join_token, &details.users[1].id)
        .await;
    assert_eq!(result.unwrap_err(), WarikanError::JoinTokenExpired);
}

#[tokio::test]
async fn test_leave_only_unlinks_the_callers_own_participant() {
    let service = create_test_service();
    let alice = register(&service, "Alice").await;
    let bob = register(&service, "Bob").await;
    let details = create_group(&service, &alice, &["Bob"]).await;
    let group_id = details.group.id;
    let host_id = details.users[0].id;

    let result = service.leave_group(&bob, &group_id, &host_id).await;
    assert!(matches!(result, Err(WarikanError::Forbidden(_))));

    service.leave_group(&alice, &group_id, &host_id).await.unwrap();
    let details = service.get_group_details(&group_id).await.unwrap();
    assert_eq!(details.users.len(), 2);
    assert_eq!(details.users[0].auth_user_uid, None);
    assert!(service.list_groups(&alice).await.unwrap().is_empty());
}
