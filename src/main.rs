use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;
use warikan::config::CONFIG;
use warikan::core::money::CurrencyCode;
use warikan::{InMemoryLogging, InMemoryStorage, WarikanService, app_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&CONFIG.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("Loaded configuration: {:?}", *CONFIG);

    let default_currency = CurrencyCode::parse(&CONFIG.default_currency)?;
    let service = Arc::new(WarikanService::new(
        InMemoryStorage::new(),
        InMemoryLogging::new(),
        CONFIG.jwt_secret.clone(),
        CONFIG.token_ttl_secs,
        default_currency,
    ));

    let app = app_router(service, Duration::from_secs(CONFIG.request_timeout_secs));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
