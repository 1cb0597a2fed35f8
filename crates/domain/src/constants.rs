//! Protocol constants
//!
//! Centralized location for the fixed paths, error codes and timings the
//! session manager and query engine rely on.

use std::time::Duration;

// Session refresh cadence
pub const REFRESH_INTERVAL_MS: u64 = 7_200_000;
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(REFRESH_INTERVAL_MS);

// Remote API paths
pub const TOKEN_ENDPOINT_PATH: &str = "/services/oauth2/token";
pub const DATA_API_PATH: &str = "/services/data";
pub const USERINFO_PATH: &str = "/services/oauth2/userinfo";

// OAuth grant types
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

// Error codes reported by the remote API or synthesized locally
pub const INVALID_SESSION_ID: &str = "INVALID_SESSION_ID";
pub const MALFORMED_PAGE: &str = "MALFORMED_PAGE";
pub const MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";

/// Maximum number of response body characters carried into an error message.
pub const MAX_ERROR_BODY_CHARS: usize = 512;
