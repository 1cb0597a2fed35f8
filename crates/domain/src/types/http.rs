//! Transport-neutral HTTP request and response values
//!
//! These are what the core hands to, and receives from, the HTTP executor
//! port. They carry no client state, so the same request can be replayed by
//! an executor that retries.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{MALFORMED_RESPONSE, MAX_ERROR_BODY_CHARS};
use crate::errors::{ForceLinkError, Result};

/// HTTP methods used against the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: None }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn form(self, fields: &[(&str, &str)]) -> Self {
        let encoded = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let mut request = self.header("Content-Type", "application/x-www-form-urlencoded");
        request.body = Some(encoded);
        request
    }

    /// First header value with the given name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as returned by the executor. Any status code is a successful
/// execution; only transport failures are errors at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decode the body as JSON, reporting undecodable payloads as API errors.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            ForceLinkError::api(
                self.status,
                MALFORMED_RESPONSE,
                format!("Failed to parse response: {e}; body: {}", self.body_excerpt()),
            )
        })
    }

    /// Body truncated for inclusion in error messages.
    pub fn body_excerpt(&self) -> String {
        if self.body.chars().count() <= MAX_ERROR_BODY_CHARS {
            return self.body.clone();
        }
        let mut excerpt: String = self.body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        excerpt.push_str("...");
        excerpt
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
}
