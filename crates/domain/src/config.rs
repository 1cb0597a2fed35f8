//! Configuration structures
//!
//! Loaded by `forcelink-infra::config`; every section has defaults so a
//! config file only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::types::SessionConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Tenants to register at startup.
    #[serde(default)]
    pub tenants: Vec<SessionConfig>,
}

/// HTTP executor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_seconds: u64,
    /// Total attempts per request (initial try + retries).
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_attempts: 3,
            base_backoff_ms: 200,
            user_agent: concat!("forcelink/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
