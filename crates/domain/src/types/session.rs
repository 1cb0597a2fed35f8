//! Tenant session records
//!
//! A [`Session`] is the unit the session store swaps atomically. It is built
//! once per successful registration or refresh and never edited afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ForceLinkError, Result};
use crate::impl_domain_status_conversions;
use crate::types::client::ClientHandle;
use crate::types::oauth::{OAuthGrant, TokenGrant};
use crate::types::tenant::TenantId;

/// Per-tenant credentials and tokens.
///
/// The `code`, `code_verifier` and `code_challenge_method` fields are only
/// needed for the first exchange and are cleared once a session exists.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    pub tenant_id: TenantId,
    pub auth_url: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub code_verifier: Option<String>,
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

impl SessionConfig {
    /// Registration input for an authorization-code exchange.
    pub fn authorization_code(
        tenant_id: TenantId,
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            access_token: None,
            refresh_token: None,
            code: Some(code.into()),
            code_verifier: None,
            code_challenge_method: None,
        }
    }

    /// Attach a PKCE verifier to the pending exchange.
    #[must_use]
    pub fn with_pkce(
        mut self,
        code_verifier: impl Into<String>,
        code_challenge_method: impl Into<String>,
    ) -> Self {
        self.code_verifier = Some(code_verifier.into());
        self.code_challenge_method = Some(code_challenge_method.into());
        self
    }

    /// Check the fields every exchange needs.
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.auth_url).map_err(|e| {
            ForceLinkError::InvalidInput(format!("invalid auth_url '{}': {e}", self.auth_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ForceLinkError::InvalidInput(format!(
                "auth_url must be http(s): {}",
                self.auth_url
            )));
        }
        if self.client_id.trim().is_empty() {
            return Err(ForceLinkError::InvalidInput("client_id must not be empty".into()));
        }
        Ok(())
    }

    /// Grant for the first exchange.
    pub fn authorization_code_grant(&self) -> Result<OAuthGrant> {
        let code = self.code.clone().filter(|c| !c.is_empty()).ok_or_else(|| {
            ForceLinkError::InvalidInput(format!(
                "tenant {} has no authorization code to exchange",
                self.tenant_id
            ))
        })?;
        if self.redirect_uri.trim().is_empty() {
            return Err(ForceLinkError::InvalidInput(
                "redirect_uri is required for an authorization-code exchange".into(),
            ));
        }
        Ok(OAuthGrant::AuthorizationCode {
            code,
            code_verifier: self.code_verifier.clone(),
            code_challenge_method: self.code_challenge_method.clone(),
        })
    }

    /// Grant for a refresh of an established session.
    pub fn refresh_grant(&self) -> Result<OAuthGrant> {
        self.refresh_token
            .clone()
            .map(|refresh_token| OAuthGrant::RefreshToken { refresh_token })
            .ok_or_else(|| {
                ForceLinkError::Auth(format!("tenant {} has no refresh token", self.tenant_id))
            })
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SessionConfig")
            .field("tenant_id", &self.tenant_id)
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("code", &redact(&self.code))
            .field("code_challenge_method", &self.code_challenge_method)
            .finish_non_exhaustive()
    }
}

/// Minimal identity of the authenticated user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    /// Full payload as returned by the identity endpoint.
    pub raw: serde_json::Value,
}

impl Identity {
    /// Extract the known fields from an identity or userinfo payload.
    pub fn from_payload(raw: serde_json::Value) -> Self {
        let field = |keys: &[&str]| {
            keys.iter().find_map(|k| raw.get(*k).and_then(|v| v.as_str()).map(str::to_string))
        };
        Self {
            user_id: field(&["user_id"]),
            organization_id: field(&["organization_id"]),
            username: field(&["username", "preferred_username"]),
            display_name: field(&["display_name", "name"]),
            raw,
        }
    }
}

/// Live authenticated binding between a tenant and a remote instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub tenant_id: TenantId,
    pub config: SessionConfig,
    pub client_handle: ClientHandle,
    pub instance_url: String,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Build the first session of a tenant from a successful exchange.
    pub fn establish(
        mut config: SessionConfig,
        grant: TokenGrant,
        client_handle: ClientHandle,
        identity: Identity,
    ) -> Self {
        config.access_token = Some(grant.access_token);
        if grant.refresh_token.is_some() {
            config.refresh_token = grant.refresh_token;
        }
        config.code = None;
        config.code_verifier = None;
        config.code_challenge_method = None;

        Self {
            tenant_id: config.tenant_id.clone(),
            instance_url: client_handle.instance_url().to_string(),
            config,
            client_handle,
            identity,
            issued_at: grant.issued_at,
        }
    }

    /// The session that replaces this one after a successful refresh.
    ///
    /// Token and client handle are replaced together; a refresh response
    /// without a refresh token keeps the current one.
    #[must_use]
    pub fn refreshed(&self, grant: TokenGrant) -> Self {
        let mut config = self.config.clone();
        config.access_token = Some(grant.access_token.clone());
        if grant.refresh_token.is_some() {
            config.refresh_token = grant.refresh_token;
        }

        let client_handle = match grant.instance_url {
            Some(url) if url.trim_end_matches('/') != self.instance_url => ClientHandle::new(
                url,
                self.client_handle.api_version(),
                grant.access_token,
            ),
            _ => self.client_handle.with_access_token(grant.access_token),
        };

        Self {
            tenant_id: self.tenant_id.clone(),
            instance_url: client_handle.instance_url().to_string(),
            config,
            client_handle,
            identity: self.identity.clone(),
            issued_at: grant.issued_at,
        }
    }

    pub fn access_token(&self) -> &str {
        self.client_handle.access_token()
    }

    /// Whether the client handle and config carry the same access token.
    pub fn is_consistent(&self) -> bool {
        self.config.access_token.as_deref() == Some(self.client_handle.access_token())
    }

    pub fn public_info(&self) -> PublicSessionInfo {
        PublicSessionInfo {
            tenant_id: self.tenant_id.clone(),
            instance_url: self.instance_url.clone(),
            api_version: self.client_handle.api_version().to_string(),
            identity: self.identity.clone(),
            access_token: self.client_handle.access_token().to_string(),
            refresh_token: self.config.refresh_token.clone(),
            issued_at: self.issued_at,
        }
    }

    pub fn refreshed_info(&self) -> RefreshedInfo {
        RefreshedInfo {
            tenant_id: self.tenant_id.clone(),
            access_token: self.client_handle.access_token().to_string(),
            refresh_token: self.config.refresh_token.clone(),
            issued_at: self.issued_at,
        }
    }
}

/// Returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicSessionInfo {
    pub tenant_id: TenantId,
    pub instance_url: String,
    pub api_version: String,
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// Returned by a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshedInfo {
    pub tenant_id: TenantId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// Whether the last refresh attempt of a tenant succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Last mutation succeeded.
    Active,
    /// Last refresh failed; the previous session is still served.
    Stale,
}

impl_domain_status_conversions!(TenantStatus {
    Active => "active",
    Stale => "stale",
});

/// Refresh bookkeeping reported alongside a tenant's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionHealth {
    pub status: TenantStatus,
    pub consecutive_failures: u32,
    pub last_success_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl SessionHealth {
    pub fn active(at: DateTime<Utc>) -> Self {
        Self {
            status: TenantStatus::Active,
            consecutive_failures: 0,
            last_success_at: at,
            last_error: None,
        }
    }

    #[must_use]
    pub fn failed(&self, error: &ForceLinkError) -> Self {
        Self {
            status: TenantStatus::Stale,
            consecutive_failures: self.consecutive_failures.saturating_add(1),
            last_success_at: self.last_success_at,
            last_error: Some(error.to_string()),
        }
    }
}
