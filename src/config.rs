use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "RxGuard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8085";
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2000;

const ENV_BIND_ADDR: &str = "RXGUARD_BIND_ADDR";
const ENV_DB_PATH: &str = "RXGUARD_DB_PATH";
const ENV_REFERENCE_JSON: &str = "RXGUARD_REFERENCE_JSON";
const ENV_LOOKUP_TIMEOUT_MS: &str = "RXGUARD_LOOKUP_TIMEOUT_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Cannot determine home directory; set {0}")]
    NoHomeDir(&'static str),
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "rxguard=info,tower_http=warn"
}

/// Application data directory: ~/RxGuard/
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default SQLite reference database location.
pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("reference.db"))
}

/// Where reference data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceSource {
    Sqlite(PathBuf),
    Json(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub reference: ReferenceSource,
    pub lookup_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                var: ENV_BIND_ADDR,
                reason: format!("'{bind_raw}': {e}"),
            })?;

        let lookup_timeout = match get(ENV_LOOKUP_TIMEOUT_MS) {
            Some(raw) => {
                let ms = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        var: ENV_LOOKUP_TIMEOUT_MS,
                        reason: format!("'{raw}': {e}"),
                    })?;
                if ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: ENV_LOOKUP_TIMEOUT_MS,
                        reason: "must be greater than zero".into(),
                    });
                }
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
        };

        let reference = match get(ENV_REFERENCE_JSON) {
            Some(path) => ReferenceSource::Json(PathBuf::from(path)),
            None => {
                let path = match get(ENV_DB_PATH) {
                    Some(path) => PathBuf::from(path),
                    None => default_db_path().ok_or(ConfigError::NoHomeDir(ENV_DB_PATH))?,
                };
                ReferenceSource::Sqlite(path)
            }
        };

        Ok(Self {
            bind_addr,
            reference,
            lookup_timeout,
        })
    }
}
