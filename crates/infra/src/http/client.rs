use std::time::Duration;

use async_trait::async_trait;
use forcelink_core::HttpExecutor;
use forcelink_domain::{ForceLinkError, HttpMethod, HttpRequest, HttpResponse, HttpSettings};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with built-in retry and timeout support.
///
/// Retries connect failures with exponential backoff, and for idempotent
/// methods also timeouts and 5xx responses. A POST that reached the server
/// is never resent, since token grants are single use. Any other status is
/// returned to the caller as is. Gzip bodies
/// are decoded transparently.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ForceLinkError> {
        Self::builder().build()
    }

    /// Client configured from the `[http]` settings section.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, ForceLinkError> {
        Self::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .max_attempts(settings.max_attempts)
            .base_backoff(Duration::from_millis(settings.base_backoff_ms))
            .user_agent(settings.user_agent.clone())
            .build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ForceLinkError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                ForceLinkError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder.build().map_err(|err| {
                let infra: InfraError = err.into();
                ForceLinkError::from(infra)
            })?;

            let method = request.method().clone();
            let url = redacted_url(request.url());
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && method.is_idempotent() && attempt + 1 < attempts
                    {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err, &method) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    let infra: InfraError = err.into();
                    return Err(ForceLinkError::from(infra));
                }
            }
        }

        Err(ForceLinkError::Internal(
            "http client exhausted retries without producing a result".into(),
        ))
    }

    fn to_builder(&self, request: HttpRequest) -> RequestBuilder {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HttpExecutor for HttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ForceLinkError> {
        let response = self.send(self.to_builder(request)).await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(|err| {
            let infra: InfraError = err.into();
            ForceLinkError::from(infra)
        })?;

        Ok(HttpResponse { status, headers, body })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("max_attempts", &self.max_attempts)
            .field("base_backoff", &self.base_backoff)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        let defaults = HttpSettings::default();
        Self {
            timeout: Duration::from_secs(defaults.timeout_seconds),
            max_attempts: defaults.max_attempts,
            base_backoff: Duration::from_millis(defaults.base_backoff_ms),
            user_agent: None,
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, ForceLinkError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).gzip(true).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            ForceLinkError::from(infra)
        })?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

/// A request that never connected is always safe to resend. Anything else
/// may have reached the server, so only idempotent methods are retried.
fn should_retry_error(err: &reqwest::Error, method: &Method) -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    (err.is_timeout() || err.is_request()) && method.is_idempotent()
}

/// URL without its query string; SOQL can carry customer data.
fn redacted_url(url: &reqwest::Url) -> String {
    let mut shown = url.clone();
    if shown.query().is_some() {
        shown.set_query(Some("…"));
    }
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use reqwest::{Method, StatusCode};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .base_backoff(Duration::from_millis(10))
            .max_attempts(3)
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200).set_body_string("[]")
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response = client
            .execute(HttpRequest::get(format!("{}/services/data", server.uri())))
            .await
            .expect("response");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "[]");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts_and_returns_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response = client.execute(HttpRequest::get(server.uri())).await.expect("response");

        assert_eq!(response.status, 500);
        assert_eq!(response.body, "down");
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response = client.execute(HttpRequest::get(server.uri())).await.expect("response");

        assert_eq!(response.status, 404);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn post_is_not_resent_after_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let request = HttpRequest::post(format!("{}/services/oauth2/token", server.uri()))
            .form(&[("grant_type", "authorization_code"), ("code", "single-use")]);
        let response = client_with_defaults().execute(request).await.expect("response");

        assert_eq!(response.status, 503);
        assert_eq!(response.body, "unavailable");
    }

    #[tokio::test]
    async fn forwards_headers_and_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("grant_type=refresh_token&refresh_token=r%2F1"))
            .respond_with(ResponseTemplate::new(200).insert_header("x-request-id", "abc"))
            .expect(1)
            .mount(&server)
            .await;

        let request = HttpRequest::post(format!("{}/services/oauth2/token", server.uri()))
            .form(&[("grant_type", "refresh_token"), ("refresh_token", "r/1")]);
        let response = client_with_defaults().execute(request).await.expect("response");

        assert_eq!(response.status, 200);
        assert_eq!(response.header_value("X-Request-Id"), Some("abc"));
    }

    #[tokio::test]
    async fn decodes_gzip_bodies() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"{"done":true}"#).unwrap();
        let compressed = encoder.finish().unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-encoding", "gzip")
                    .set_body_bytes(compressed),
            )
            .mount(&server)
            .await;

        let response =
            client_with_defaults().execute(HttpRequest::get(server.uri())).await.expect("response");
        assert_eq!(response.body, r#"{"done":true}"#);
    }

    #[tokio::test]
    async fn retries_on_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}", addr);

        let client = HttpClient::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .expect("http client");

        let result = client.execute(HttpRequest::get(url)).await;
        match result {
            Err(ForceLinkError::Transport(msg)) => {
                assert!(msg.to_lowercase().contains("connection"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let client = HttpClient::builder().base_backoff(Duration::from_millis(100)).build().unwrap();
        assert_eq!(client.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(client.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(client.backoff_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn query_strings_are_not_logged() {
        let url = reqwest::Url::parse("https://na1.example.com/services/data/v62.0/query?q=SELECT").unwrap();
        assert!(!redacted_url(&url).contains("SELECT"));
    }
}
