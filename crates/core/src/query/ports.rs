use async_trait::async_trait;
use forcelink_domain::{ClientHandle, QueryResult, Result};

/// Fetches query pages on behalf of a [`QueryStream`](super::QueryStream).
///
/// Implementations return pages that satisfy [`QueryResult::validate`].
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Run `soql` and return its first page.
    async fn query(&self, client: &ClientHandle, soql: &str) -> Result<QueryResult>;

    /// Fetch the page a previous page's cursor points at.
    async fn query_more(&self, client: &ClientHandle, cursor: &str) -> Result<QueryResult>;
}
