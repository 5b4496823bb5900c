use crate::core::errors::WarikanError;
use crate::core::models::audit::AppLog;
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), WarikanError> {
        let details = serde_json::from_value(details)
            .map_err(|e| WarikanError::LoggingError(format!("Log details must be a JSON object: {}", e)))?;
        let mut logs = self.logs.write().await;
        logs.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Newest entries first.
    async fn get_logs(&self, limit: Option<usize>) -> Result<Vec<AppLog>, WarikanError> {
        let logs = self.logs.read().await;
        let limit = limit.unwrap_or(logs.len());
        Ok(logs.iter().rev().take(limit).cloned().collect())
    }
}
