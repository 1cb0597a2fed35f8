//! Mapping of non-2xx responses onto [`ForceLinkError::Api`]

use forcelink_domain::{ApiFailure, ForceLinkError, HttpResponse};
use serde::Deserialize;

/// `[{"errorCode": "...", "message": "..."}]` as returned by the data API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestErrorBody {
    error_code: String,
    #[serde(default)]
    message: String,
}

/// `{"error": "...", "error_description": "..."}` as returned by OAuth
/// endpoints.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Describe a non-2xx response as an [`ApiFailure`].
///
/// Unknown bodies fall back to `HTTP_<status>` with a truncated excerpt.
pub fn api_failure(response: &HttpResponse) -> ApiFailure {
    if let Ok(errors) = serde_json::from_str::<Vec<RestErrorBody>>(&response.body) {
        if let Some(first) = errors.into_iter().next() {
            return ApiFailure::new(response.status, first.error_code, first.message);
        }
    }
    if let Ok(single) = serde_json::from_str::<RestErrorBody>(&response.body) {
        return ApiFailure::new(response.status, single.error_code, single.message);
    }
    if let Ok(oauth) = serde_json::from_str::<OAuthErrorBody>(&response.body) {
        return ApiFailure::new(
            response.status,
            oauth.error,
            oauth.error_description.unwrap_or_default(),
        );
    }
    ApiFailure::new(response.status, format!("HTTP_{}", response.status), response.body_excerpt())
}

/// [`api_failure`] wrapped as an error.
pub fn api_error(response: &HttpResponse) -> ForceLinkError {
    ForceLinkError::Api(api_failure(response))
}
