//! Immutable client handle bound to one authenticated session

use std::fmt;

use url::Url;

use crate::constants::{DATA_API_PATH, MALFORMED_PAGE};
use crate::errors::{ForceLinkError, Result};
use crate::types::http::HttpRequest;

/// Connection parameters sufficient to issue data API requests.
///
/// A handle is never mutated: refreshing a session builds a new handle, so a
/// caller holding an old one keeps a consistent (if stale) view.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientHandle {
    instance_url: String,
    api_version: String,
    access_token: String,
}

impl ClientHandle {
    pub fn new(
        instance_url: impl Into<String>,
        api_version: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        Self { instance_url, api_version: api_version.into(), access_token: access_token.into() }
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Versioned data API base path, e.g. `/services/data/v62.0`.
    pub fn data_path(&self) -> String {
        format!("{DATA_API_PATH}/v{}", self.api_version)
    }

    /// Absolute URL for a path on this instance. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.instance_url)
        } else {
            format!("{}/{path}", self.instance_url)
        }
    }

    /// URL of the SOQL query endpoint for `soql`.
    pub fn query_url(&self, soql: &str) -> String {
        format!("{}{}/query?q={}", self.instance_url, self.data_path(), urlencoding::encode(soql))
    }

    /// URL of a server-issued `nextRecordsUrl` cursor.
    ///
    /// Cursors are instance-relative paths. An absolute cursor is accepted
    /// only when it points back at this instance, since the request carries
    /// the bearer token.
    pub fn cursor_url(&self, cursor: &str) -> Result<String> {
        let resolved = self.url(cursor);
        if !self.is_same_origin(&resolved) {
            return Err(ForceLinkError::api(
                200,
                MALFORMED_PAGE,
                format!("nextRecordsUrl leaves the instance: {cursor}"),
            ));
        }
        Ok(resolved)
    }

    fn is_same_origin(&self, url: &str) -> bool {
        match (Url::parse(url), Url::parse(&self.instance_url)) {
            (Ok(target), Ok(instance)) => target.origin() == instance.origin(),
            _ => false,
        }
    }

    /// Authenticated GET request for `path_or_url`.
    pub fn get(&self, path_or_url: &str) -> HttpRequest {
        HttpRequest::get(self.url(path_or_url))
            .header("Authorization", self.authorization_header())
            .header("Accept", "application/json")
    }

    /// A new handle for the same instance and version with a fresh token.
    #[must_use]
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: self.instance_url.clone(),
            api_version: self.api_version.clone(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
