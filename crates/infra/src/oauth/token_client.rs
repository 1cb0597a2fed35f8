//! Token endpoint client
//!
//! Posts form-encoded grants to `<auth_url>/services/oauth2/token`. The
//! response carries `instance_url`, `id` and a millisecond `issued_at`
//! besides the usual token pair, so it is decoded directly rather than
//! through a generic OAuth client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forcelink_core::api::api_failure;
use forcelink_core::{HttpExecutor, OAuthExchanger};
use forcelink_domain::constants::TOKEN_ENDPOINT_PATH;
use forcelink_domain::{ForceLinkError, HttpRequest, OAuthGrant, Result, SessionConfig, TokenGrant};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    instance_url: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    issued_at: Option<String>,
}

/// [`OAuthExchanger`] speaking to the tenant's token endpoint.
#[derive(Clone)]
pub struct TokenEndpointClient {
    http: Arc<dyn HttpExecutor>,
}

impl TokenEndpointClient {
    pub fn new(http: Arc<dyn HttpExecutor>) -> Self {
        Self { http }
    }

    /// Token endpoint of `auth_url`.
    pub fn token_url(auth_url: &str) -> String {
        format!("{}{TOKEN_ENDPOINT_PATH}", auth_url.trim_end_matches('/'))
    }
}

fn form_fields<'a>(config: &'a SessionConfig, grant: &'a OAuthGrant) -> Vec<(&'static str, &'a str)> {
    let mut fields = vec![("grant_type", grant.grant_type()), ("client_id", config.client_id.as_str())];
    if !config.client_secret.is_empty() {
        fields.push(("client_secret", config.client_secret.as_str()));
    }

    match grant {
        OAuthGrant::AuthorizationCode { code, code_verifier, code_challenge_method } => {
            fields.push(("redirect_uri", config.redirect_uri.as_str()));
            fields.push(("code", code.as_str()));
            if let Some(verifier) = code_verifier {
                fields.push(("code_verifier", verifier.as_str()));
            }
            if let Some(method) = code_challenge_method {
                fields.push(("code_challenge_method", method.as_str()));
            }
        }
        OAuthGrant::RefreshToken { refresh_token } => {
            fields.push(("refresh_token", refresh_token.as_str()));
        }
    }
    fields
}

/// `issued_at` is epoch milliseconds as a string; fall back to now.
fn parse_issued_at(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl OAuthExchanger for TokenEndpointClient {
    #[instrument(skip(self, config, grant), fields(tenant = %config.tenant_id, grant_type = grant.grant_type()))]
    async fn exchange(&self, config: &SessionConfig, grant: &OAuthGrant) -> Result<TokenGrant> {
        let request = HttpRequest::post(Self::token_url(&config.auth_url))
            .header("Accept", "application/json")
            .form(&form_fields(config, grant));

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            let failure = api_failure(&response);
            warn!(status = failure.status, error_code = %failure.error_code, "token exchange rejected");
            return Err(ForceLinkError::Auth(format!(
                "{} grant rejected: {failure}",
                grant.grant_type()
            )));
        }

        let body: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| ForceLinkError::Auth(format!("undecodable token response: {e}")))?;
        if body.access_token.is_empty() {
            return Err(ForceLinkError::Auth("token response carried an empty access_token".into()));
        }

        debug!(
            instance = body.instance_url.as_deref().unwrap_or("-"),
            rotated_refresh_token = body.refresh_token.is_some(),
            "token exchange succeeded"
        );
        Ok(TokenGrant {
            access_token: body.access_token,
            refresh_token: body.refresh_token.filter(|t| !t.is_empty()),
            instance_url: body.instance_url.filter(|u| !u.is_empty()),
            id: body.id.filter(|i| !i.is_empty()),
            issued_at: parse_issued_at(body.issued_at.as_deref()),
        })
    }
}

impl std::fmt::Debug for TokenEndpointClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEndpointClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use forcelink_domain::TenantId;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::HttpClient;

    fn client() -> TokenEndpointClient {
        let http = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .expect("http client");
        TokenEndpointClient::new(Arc::new(http))
    }

    fn config(auth_url: &str) -> SessionConfig {
        SessionConfig::authorization_code(
            TenantId::new("acme").unwrap(),
            auth_url,
            "3MVG9-client",
            "s3cret",
            "https://app.example.com/oauth/callback",
            "aPrx.code",
        )
        .with_pkce("verifier-xyz", "S256")
    }

    #[tokio::test]
    async fn authorization_code_exchange_posts_every_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_id=3MVG9-client"))
            .and(body_string_contains("client_secret=s3cret"))
            .and(body_string_contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Foauth%2Fcallback"))
            .and(body_string_contains("code=aPrx.code"))
            .and(body_string_contains("code_verifier=verifier-xyz"))
            .and(body_string_contains("code_challenge_method=S256"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "00Dxx!access",
                "refresh_token": "5Aep-refresh",
                "instance_url": "https://na1.example.com",
                "id": "https://login.example.com/id/00Dxx/005xx",
                "issued_at": "1700000000000",
                "token_type": "Bearer",
                "signature": "sig"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = config(&format!("{}/", server.uri()));
        let grant = cfg.authorization_code_grant().unwrap();
        let tokens = client().exchange(&cfg, &grant).await.expect("tokens");

        assert_eq!(tokens.access_token, "00Dxx!access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("5Aep-refresh"));
        assert_eq!(tokens.instance_url.as_deref(), Some("https://na1.example.com"));
        assert_eq!(tokens.id.as_deref(), Some("https://login.example.com/id/00Dxx/005xx"));
        assert_eq!(tokens.issued_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn refresh_exchange_sends_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=5Aep-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "00Dxx!renewed",
                "instance_url": "https://na1.example.com",
                "issued_at": "not-a-number"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = config(&server.uri());
        let grant = OAuthGrant::RefreshToken { refresh_token: "5Aep-refresh".into() };
        let before = Utc::now();
        let tokens = client().exchange(&cfg, &grant).await.expect("tokens");

        assert_eq!(tokens.access_token, "00Dxx!renewed");
        assert!(tokens.refresh_token.is_none());
        assert!(tokens.issued_at >= before);
    }

    #[tokio::test]
    async fn rejected_grant_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "expired access/refresh token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = config(&server.uri());
        let grant = OAuthGrant::RefreshToken { refresh_token: "stale".into() };
        let err = client().exchange(&cfg, &grant).await.unwrap_err();

        match err {
            ForceLinkError::Auth(message) => {
                assert!(message.contains("invalid_grant"));
                assert!(message.contains("expired access/refresh token"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let cfg = config(&format!("http://{addr}"));
        let grant = cfg.authorization_code_grant().unwrap();
        let err = client().exchange(&cfg, &grant).await.unwrap_err();

        assert!(matches!(err, ForceLinkError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn public_clients_omit_the_secret() {
        let mut cfg = config("https://login.example.com");
        cfg.client_secret.clear();
        let grant = cfg.authorization_code_grant().unwrap();

        let fields = form_fields(&cfg, &grant);
        assert!(fields.iter().all(|(name, _)| *name != "client_secret"));
        assert!(fields.contains(&("code", "aPrx.code")));
    }

    #[test]
    fn token_url_tolerates_trailing_slash() {
        assert_eq!(
            TokenEndpointClient::token_url("https://login.example.com/"),
            "https://login.example.com/services/oauth2/token"
        );
    }
}
