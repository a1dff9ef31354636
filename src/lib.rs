pub mod api;
pub mod clinical;
pub mod config;
pub mod db;
pub mod models;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::clinical::{CdsError, CdsService, InMemoryReferenceStore, ReferenceStore};
use crate::config::{ConfigError, ReferenceSource, ServiceConfig};
use crate::db::{DatabaseError, SqliteReferenceStore};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reference database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Reference data error: {0}")]
    ReferenceData(#[from] CdsError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Initialize tracing. `RUST_LOG` overrides `config::default_log_filter()`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Open the reference store named by the configuration.
pub fn open_reference_store(
    source: &ReferenceSource,
) -> Result<Arc<dyn ReferenceStore>, StartupError> {
    let store: Arc<dyn ReferenceStore> = match source {
        ReferenceSource::Json(path) => {
            tracing::info!(path = %path.display(), "Loading JSON reference bundle");
            Arc::new(InMemoryReferenceStore::load_json(path)?)
        }
        ReferenceSource::Sqlite(path) => {
            tracing::info!(path = %path.display(), "Opening SQLite reference database");
            Arc::new(SqliteReferenceStore::open(path)?)
        }
    };
    Ok(store)
}

/// Start the service and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;
    let store = open_reference_store(&config.reference)?;
    let service = Arc::new(CdsService::with_store(store, config.lookup_timeout));

    let mut server = api::start_api_server(service, config.bind_addr)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(
        addr = %server.session.server_addr,
        session_id = %server.session.session_id,
        lookup_timeout_ms = config.lookup_timeout.as_millis() as u64,
        "RxGuard listening"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }

    server.shutdown();
    server.stopped().await;
    Ok(())
}
