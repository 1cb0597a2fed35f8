//! Port interfaces for the two external capabilities the core consumes
//!
//! Implementations live in `forcelink-infra`; tests substitute in-memory
//! doubles.

use async_trait::async_trait;
use forcelink_domain::{HttpRequest, HttpResponse, OAuthGrant, Result, SessionConfig, TokenGrant};

/// Executes one HTTP request.
///
/// Any status code is a successful execution. Only transport failures
/// (connect, DNS, timeout) are returned as errors, as
/// `ForceLinkError::Transport`. Retrying is the implementation's business;
/// the core never retries.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Exchanges a grant for a token triple at the tenant's token endpoint.
#[async_trait]
pub trait OAuthExchanger: Send + Sync {
    /// Perform the exchange using the client credentials in `config`.
    ///
    /// Rejections are `ForceLinkError::Auth`; transport failures are
    /// `ForceLinkError::Transport`.
    async fn exchange(&self, config: &SessionConfig, grant: &OAuthGrant) -> Result<TokenGrant>;
}
