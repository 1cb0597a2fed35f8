//! Configuration loader
//!
//! Loads ForceLink configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Seeds the process environment from a `.env` file, if one exists
//! 2. Attempts to load from `FORCELINK_*` environment variables
//! 3. If none are set, falls back to loading from file
//! 4. Searches multiple paths for config files
//! 5. Supports JSON and TOML formats
//! 6. With no variables and no file, every setting keeps its default
//!
//! ## Environment Variables
//! - `FORCELINK_HTTP_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `FORCELINK_HTTP_MAX_ATTEMPTS`: Attempts per request, retries included
//! - `FORCELINK_HTTP_BACKOFF_MS`: Base retry backoff in milliseconds
//! - `FORCELINK_HTTP_USER_AGENT`: User agent sent with every request
//! - `FORCELINK_LOG_LEVEL`: Default log filter when `RUST_LOG` is unset
//! - `FORCELINK_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! Tenant registrations can only be listed in a file (`[[tenants]]`).
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./forcelink.toml` or `./forcelink.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use forcelink_domain::{Config, ForceLinkError, HttpSettings, LoggingSettings, Result};

use crate::errors::InfraError;

const ENV_KEYS: [&str; 6] = [
    "FORCELINK_HTTP_TIMEOUT_SECS",
    "FORCELINK_HTTP_MAX_ATTEMPTS",
    "FORCELINK_HTTP_BACKOFF_MS",
    "FORCELINK_HTTP_USER_AGENT",
    "FORCELINK_LOG_LEVEL",
    "FORCELINK_LOG_JSON",
];

const CONFIG_FILE_NAMES: [&str; 4] =
    ["forcelink.toml", "forcelink.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `ForceLinkError::Config` if an environment variable holds an
/// invalid value, or a discovered config file cannot be read or parsed.
pub fn load() -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Could not load .env file"),
    }

    if env_configured() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    match search_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No configuration source found, using defaults");
            Ok(Config::default())
        }
    }
}

fn env_configured() -> bool {
    ENV_KEYS.iter().any(|key| std::env::var_os(key).is_some())
}

/// Load configuration from environment variables
///
/// Unset variables keep their defaults, but at least one must be present.
///
/// # Errors
/// Returns `ForceLinkError::Config` if no variable is set or one has an
/// invalid value.
pub fn load_from_env() -> Result<Config> {
    if !env_configured() {
        return Err(ForceLinkError::Config(
            "No FORCELINK_* environment variables set".to_string(),
        ));
    }

    let defaults = HttpSettings::default();
    let http = HttpSettings {
        timeout_seconds: env_parse("FORCELINK_HTTP_TIMEOUT_SECS", defaults.timeout_seconds)?,
        max_attempts: env_parse("FORCELINK_HTTP_MAX_ATTEMPTS", defaults.max_attempts)?,
        base_backoff_ms: env_parse("FORCELINK_HTTP_BACKOFF_MS", defaults.base_backoff_ms)?,
        user_agent: std::env::var("FORCELINK_HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
    };
    if http.max_attempts == 0 {
        return Err(ForceLinkError::Config("FORCELINK_HTTP_MAX_ATTEMPTS must be at least 1".into()));
    }

    let log_defaults = LoggingSettings::default();
    let logging = LoggingSettings {
        level: std::env::var("FORCELINK_LOG_LEVEL").unwrap_or(log_defaults.level),
        json: env_bool("FORCELINK_LOG_JSON", log_defaults.json),
    };

    Ok(Config { http, logging, tenants: Vec::new() })
}

/// Load configuration from a file
///
/// If `path` is `None`, searches multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ForceLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A listed tenant is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ForceLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => search_config_paths().ok_or_else(|| {
            ForceLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(InfraError::from)?;
    let config = parse_config(&contents, &config_path)?;

    for tenant in &config.tenants {
        tenant.validate().map_err(|e| {
            ForceLinkError::Config(format!("tenant {} is misconfigured: {e}", tenant.tenant_id))
        })?;
    }
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents).map_err(InfraError::from)?),
        "json" => Ok(serde_json::from_str(contents).map_err(InfraError::from)?),
        _ => Err(ForceLinkError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Search multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn search_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    search_dirs(&dirs)
}

fn search_dirs(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Parse a numeric environment variable, keeping `default` when unset.
///
/// # Errors
/// Returns `ForceLinkError::Config` if the value does not parse.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ForceLinkError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
