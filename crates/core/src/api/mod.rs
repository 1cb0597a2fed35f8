//! Request shaping for the few data API calls the core makes itself:
//! version discovery, identity lookup and query pagination.

pub mod errors;
pub mod identity;
pub mod query_source;
pub mod versions;

pub use errors::{api_error, api_failure};
pub use identity::fetch_identity;
pub use query_source::RestQuerySource;
pub use versions::{fetch_latest_version, select_latest, ApiVersion};
