mod group_tests;

use crate::core::models::group::GroupDetails;
use crate::core::money::CurrencyCode;
use crate::core::services::WarikanService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub type TestService = WarikanService<InMemoryLogging, InMemoryStorage>;

pub fn create_test_service() -> TestService {
    let _ = env_logger::try_init();
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    WarikanService::new(
        storage,
        logging,
        "test-secret".to_string(),
        3600,
        CurrencyCode::parse("JPY").unwrap(),
    )
}

/// Registers an account and returns its uid.
pub async fn register(service: &TestService, name: &str) -> String {
    let email = format!("{}@example.com", name.to_lowercase());
    let (auth_user, _) = service.register_auth_user(name, &email).await.unwrap();
    auth_user.uid
}

/// Creates a group hosted by `uid` with the given participant names.
pub async fn create_group(service: &TestService, uid: &str, participants: &[&str]) -> GroupDetails {
    let participants: Vec<String> = participants.iter().map(|p| p.to_string()).collect();
    service
        .create_group(uid, "Trip", "Host", &participants, None)
        .await
        .unwrap()
}
