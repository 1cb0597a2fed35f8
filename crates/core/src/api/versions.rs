//! API version discovery

use forcelink_domain::constants::DATA_API_PATH;
use forcelink_domain::{ClientHandle, ForceLinkError, HttpRequest, Result};
use serde::Deserialize;
use tracing::debug;

use super::errors::api_error;
use crate::transport_ports::HttpExecutor;

/// One entry of `GET /services/data`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiVersion {
    pub version: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ApiVersion {
    /// `(major, minor)` of a `"62.0"`-style version; unparseable parts sort
    /// lowest.
    fn numeric_key(&self) -> (u32, u32) {
        let mut parts = self.version.split('.');
        let major = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
        let minor = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
        (major, minor)
    }
}

/// Pick the newest version, comparing numerically and then lexically.
pub fn select_latest(versions: &[ApiVersion]) -> Option<&ApiVersion> {
    versions.iter().max_by(|a, b| {
        a.numeric_key().cmp(&b.numeric_key()).then_with(|| a.version.cmp(&b.version))
    })
}

/// Fetch the version list of `instance_url` and return the latest version.
pub async fn fetch_latest_version(
    http: &dyn HttpExecutor,
    instance_url: &str,
    access_token: &str,
) -> Result<String> {
    // Any version works to address the unversioned discovery path.
    let handle = ClientHandle::new(instance_url, "", access_token);
    let request: HttpRequest = handle.get(DATA_API_PATH);
    let response = http.execute(request).await?;
    if !response.is_success() {
        return Err(api_error(&response));
    }

    let versions: Vec<ApiVersion> = response.json()?;
    let latest = select_latest(&versions).ok_or_else(|| {
        ForceLinkError::Auth(format!("{instance_url} reported no API versions"))
    })?;

    debug!(version = %latest.version, available = versions.len(), "resolved API version");
    Ok(latest.version.clone())
}
