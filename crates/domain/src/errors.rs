//! Error types used throughout ForceLink

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::INVALID_SESSION_ID;
use crate::types::TenantId;

/// A non-2xx answer from the remote data API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    /// HTTP status code
    pub status: u16,
    /// Remote error code (e.g. `INVALID_SESSION_ID`)
    pub error_code: String,
    /// Human readable message from the remote API
    pub message: String,
}

impl ApiFailure {
    pub fn new(status: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, error_code: error_code.into(), message: message.into() }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.error_code, self.status, self.message)
    }
}

/// Main error type for ForceLink
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ForceLinkError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(ApiFailure),

    #[error("Tenant not registered: {0}")]
    NotRegistered(TenantId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ForceLinkError {
    /// Build an [`ForceLinkError::Api`] from its parts.
    pub fn api(status: u16, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api(ApiFailure::new(status, error_code, message))
    }

    /// The API failure carried by this error, if any.
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Api(failure) => Some(failure),
            _ => None,
        }
    }

    /// True when the remote API rejected the bearer token.
    ///
    /// Callers may use this to decide on an explicit refresh; the session
    /// manager never reacts to it on its own.
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            Self::Api(failure) => failure.status == 401 || failure.error_code == INVALID_SESSION_ID,
            _ => false,
        }
    }

    /// Short machine-friendly label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Auth(_) => "auth",
            Self::Api(_) => "api",
            Self::NotRegistered(_) => "not_registered",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for ForceLink operations
pub type Result<T> = std::result::Result<T, ForceLinkError>;
