//! OAuth grant and token types exchanged with the token endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN};

/// The grant presented to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum OAuthGrant {
    /// First exchange for a tenant, optionally PKCE-protected.
    AuthorizationCode {
        code: String,
        code_verifier: Option<String>,
        code_challenge_method: Option<String>,
    },
    /// Unattended or explicit renewal of an established session.
    RefreshToken { refresh_token: String },
}

impl OAuthGrant {
    /// Value of the `grant_type` form field.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => GRANT_AUTHORIZATION_CODE,
            Self::RefreshToken { .. } => GRANT_REFRESH_TOKEN,
        }
    }
}

impl std::fmt::Debug for OAuthGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorizationCode { code_challenge_method, .. } => f
                .debug_struct("AuthorizationCode")
                .field("code", &"<redacted>")
                .field("code_challenge_method", code_challenge_method)
                .finish_non_exhaustive(),
            Self::RefreshToken { .. } => {
                f.debug_struct("RefreshToken").field("refresh_token", &"<redacted>").finish()
            }
        }
    }
}

/// Token triple returned by a successful exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,

    /// Refresh grants may omit this; the previous refresh token stays valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Instance base URL. Required for authorization-code grants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,

    /// Identity URL of the authenticated user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub issued_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
