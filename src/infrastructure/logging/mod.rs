pub mod in_memory;

use crate::core::errors::WarikanError;
use crate::core::models::audit::AppLog;
use async_trait::async_trait;

/// Append-only action log. Entries are kept for the `/logs` endpoint.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), WarikanError>;
    async fn get_logs(&self, limit: Option<usize>) -> Result<Vec<AppLog>, WarikanError>;
}
