//! Canonical tenant identifier

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ForceLinkError, Result};

/// Identifier of an independently authenticated API consumer.
///
/// Accepts strings and integers at the boundary and always stores the
/// trimmed string form, so `TenantId::from(42_u64)` and
/// `"42".parse::<TenantId>()` address the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTenantId", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant id, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ForceLinkError::InvalidInput("tenant id must not be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TenantId {
    type Err = ForceLinkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = ForceLinkError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for TenantId {
    type Error = ForceLinkError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<u64> for TenantId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for TenantId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Wire form of a tenant id: a string or an integer.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTenantId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl TryFrom<RawTenantId> for TenantId {
    type Error = ForceLinkError;

    fn try_from(value: RawTenantId) -> Result<Self> {
        match value {
            RawTenantId::Text(text) => Self::new(text),
            RawTenantId::Unsigned(n) => Ok(Self::from(n)),
            RawTenantId::Signed(n) => Ok(Self::from(n)),
        }
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}
