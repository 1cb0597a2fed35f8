//! Identity lookup used to validate a freshly issued token

use forcelink_domain::constants::USERINFO_PATH;
use forcelink_domain::{ClientHandle, Identity, Result};
use tracing::debug;

use super::errors::api_error;
use crate::transport_ports::HttpExecutor;

/// Fetch the identity of the token owner.
///
/// Uses the identity URL from the token response when present, otherwise
/// the instance's userinfo endpoint.
pub async fn fetch_identity(
    http: &dyn HttpExecutor,
    client: &ClientHandle,
    identity_url: Option<&str>,
) -> Result<Identity> {
    let target = identity_url.filter(|u| !u.is_empty()).unwrap_or(USERINFO_PATH);
    let response = http.execute(client.get(target)).await?;
    if !response.is_success() {
        return Err(api_error(&response));
    }

    let identity = Identity::from_payload(response.json()?);
    debug!(
        user_id = identity.user_id.as_deref().unwrap_or("-"),
        organization_id = identity.organization_id.as_deref().unwrap_or("-"),
        "identity resolved"
    );
    Ok(identity)
}
