//! Shared test helpers for `forcelink-core` integration tests.
//!
//! In-memory doubles for the two transport ports plus fixtures for a
//! single fake instance, so tests can focus on lifecycle behaviour.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use forcelink_domain::{
    ForceLinkError, HttpRequest, HttpResponse, OAuthGrant, Result, SessionConfig, TenantId,
    TokenGrant,
};
use forcelink_core::{HttpExecutor, OAuthExchanger};
use serde_json::json;

pub const INSTANCE: &str = "https://na1.example.com";

type ResponseMap = Arc<Mutex<HashMap<String, HttpResponse>>>;
type ResponseSequenceMap = Arc<Mutex<HashMap<String, Vec<HttpResponse>>>>;
type RequestLog = Arc<Mutex<Vec<HttpRequest>>>;

/// URL-keyed canned responses. Unknown URLs fail as transport errors.
#[derive(Debug, Clone, Default)]
pub struct MockHttpExecutor {
    responses: ResponseMap,
    response_sequences: ResponseSequenceMap,
    requests: RequestLog,
}

impl MockHttpExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor that answers version discovery and userinfo for [`INSTANCE`].
    pub fn for_instance() -> Self {
        let http = Self::new();
        http.add_json(
            &format!("{INSTANCE}/services/data"),
            200,
            json!([
                {"version": "60.0", "label": "Spring '24", "url": "/services/data/v60.0"},
                {"version": "62.0", "label": "Winter '25", "url": "/services/data/v62.0"},
                {"version": "61.0", "label": "Summer '24", "url": "/services/data/v61.0"}
            ]),
        );
        http.add_json(
            &format!("{INSTANCE}/services/oauth2/userinfo"),
            200,
            json!({
                "user_id": "005xx000001Sv6AAAS",
                "organization_id": "00Dxx0000001gPLEAY",
                "preferred_username": "admin@acme.test",
                "name": "Ada Admin"
            }),
        );
        http
    }

    pub fn add_response(&self, url: &str, status: u16, body: &str) {
        self.responses.lock().unwrap().insert(url.to_string(), HttpResponse::new(status, body));
    }

    pub fn add_json(&self, url: &str, status: u16, body: serde_json::Value) {
        self.add_response(url, status, &body.to_string());
    }

    /// Responses returned in order on successive calls to `url`.
    pub fn add_response_sequence(&self, url: &str, responses: Vec<(u16, String)>) {
        let sequence =
            responses.into_iter().map(|(status, body)| HttpResponse::new(status, body)).collect();
        self.response_sequences.lock().unwrap().insert(url.to_string(), sequence);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|req| req.url == url).count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl HttpExecutor for MockHttpExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        if let Some(sequence) = self.response_sequences.lock().unwrap().get_mut(&url) {
            if !sequence.is_empty() {
                return Ok(sequence.remove(0));
            }
        }

        self.responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .ok_or_else(|| ForceLinkError::Transport(format!("no response configured for {url}")))
    }
}

/// Token endpoint double issuing `access-<n>` / `refresh-<n>` pairs.
#[derive(Debug, Clone, Default)]
pub struct MockOAuthExchanger {
    issued: Arc<AtomicUsize>,
    grants: Arc<Mutex<Vec<(TenantId, OAuthGrant)>>>,
    fail_refresh: Arc<AtomicBool>,
    fail_code: Arc<AtomicBool>,
    omit_instance_url: Arc<AtomicBool>,
    rotate_refresh_token: Arc<AtomicBool>,
    delay: Arc<Mutex<Option<Duration>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockOAuthExchanger {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.rotate_refresh_token.store(true, Ordering::SeqCst);
        mock
    }

    pub fn set_refresh_fails(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub fn set_code_fails(&self, fail: bool) {
        self.fail_code.store(fail, Ordering::SeqCst);
    }

    pub fn set_omit_instance_url(&self, omit: bool) {
        self.omit_instance_url.store(omit, Ordering::SeqCst);
    }

    /// When disabled, refresh responses carry no refresh token.
    pub fn set_rotate_refresh_token(&self, rotate: bool) {
        self.rotate_refresh_token.store(rotate, Ordering::SeqCst);
    }

    /// Hold every exchange for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn grants(&self) -> Vec<(TenantId, OAuthGrant)> {
        self.grants.lock().unwrap().clone()
    }

    /// Refresh tokens presented, in call order.
    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.grants()
            .into_iter()
            .filter_map(|(_, grant)| match grant {
                OAuthGrant::RefreshToken { refresh_token } => Some(refresh_token),
                OAuthGrant::AuthorizationCode { .. } => None,
            })
            .collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_tokens_seen().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OAuthExchanger for MockOAuthExchanger {
    async fn exchange(&self, config: &SessionConfig, grant: &OAuthGrant) -> Result<TokenGrant> {
        self.grants.lock().unwrap().push((config.tenant_id.clone(), grant.clone()));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let is_refresh = matches!(grant, OAuthGrant::RefreshToken { .. });
        if is_refresh && self.fail_refresh.load(Ordering::SeqCst) {
            return Err(ForceLinkError::Auth("invalid_grant: expired access/refresh token".into()));
        }
        if !is_refresh && self.fail_code.load(Ordering::SeqCst) {
            return Err(ForceLinkError::Auth("invalid_grant: authorization code expired".into()));
        }

        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let refresh_token = if !is_refresh || self.rotate_refresh_token.load(Ordering::SeqCst) {
            Some(format!("refresh-{n}"))
        } else {
            None
        };
        let instance_url =
            (!self.omit_instance_url.load(Ordering::SeqCst)).then(|| INSTANCE.to_string());

        Ok(TokenGrant {
            access_token: format!("access-{n}"),
            refresh_token,
            instance_url,
            id: None,
            issued_at: Utc::now(),
        })
    }
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id).unwrap()
}

/// Registration input for `tenant` against the fake login host.
pub fn registration(id: &str) -> SessionConfig {
    SessionConfig::authorization_code(
        tenant(id),
        "https://login.example.com",
        "3MVG9-client",
        "client-secret",
        "https://app.example.com/oauth/callback",
        format!("code-{id}"),
    )
}
