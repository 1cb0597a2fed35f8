//! Conversions from external infrastructure errors into domain errors.

use forcelink_domain::constants::MALFORMED_RESPONSE;
use forcelink_domain::ForceLinkError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ForceLinkError);

impl From<InfraError> for ForceLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ForceLinkError> for InfraError {
    fn from(value: ForceLinkError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoForceLinkError {
    fn into_forcelink(self) -> ForceLinkError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ForceLinkError */
/* -------------------------------------------------------------------------- */

impl IntoForceLinkError for HttpError {
    fn into_forcelink(self) -> ForceLinkError {
        if self.is_timeout() {
            return ForceLinkError::Transport(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ForceLinkError::Transport(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return ForceLinkError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return ForceLinkError::api(0, MALFORMED_RESPONSE, self.to_string());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return ForceLinkError::api(
                code,
                format!("HTTP_{code}"),
                status.canonical_reason().unwrap_or("unknown status"),
            );
        }

        ForceLinkError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_forcelink())
    }
}

/* -------------------------------------------------------------------------- */
/* config parsing and file access → ForceLinkError */
/* -------------------------------------------------------------------------- */

impl IntoForceLinkError for serde_json::Error {
    fn into_forcelink(self) -> ForceLinkError {
        ForceLinkError::Config(format!("Invalid JSON format: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_forcelink())
    }
}

impl IntoForceLinkError for toml::de::Error {
    fn into_forcelink(self) -> ForceLinkError {
        ForceLinkError::Config(format!("Invalid TOML format: {self}"))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(value.into_forcelink())
    }
}

impl IntoForceLinkError for std::io::Error {
    fn into_forcelink(self) -> ForceLinkError {
        ForceLinkError::Config(format!("Failed to read config file: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_forcelink())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
