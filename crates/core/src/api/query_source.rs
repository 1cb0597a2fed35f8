//! [`PageSource`] backed by the data API query endpoints

use std::sync::Arc;

use async_trait::async_trait;
use forcelink_domain::{ClientHandle, HttpRequest, QueryResult, Result};
use tracing::{debug, instrument};

use super::errors::api_error;
use crate::query::PageSource;
use crate::transport_ports::HttpExecutor;

/// Issues `GET .../query?q=` and `GET <nextRecordsUrl>` through an
/// [`HttpExecutor`].
#[derive(Clone)]
pub struct RestQuerySource {
    http: Arc<dyn HttpExecutor>,
}

impl RestQuerySource {
    pub fn new(http: Arc<dyn HttpExecutor>) -> Self {
        Self { http }
    }

    async fn fetch(&self, request: HttpRequest) -> Result<QueryResult> {
        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }
        let page = QueryResult::from_wire(&response.body)?;
        debug!(
            done = page.done,
            total_size = page.total_size,
            records = page.records.len(),
            "query page received"
        );
        Ok(page)
    }
}

#[async_trait]
impl PageSource for RestQuerySource {
    #[instrument(skip(self, client, soql), fields(instance = %client.instance_url()))]
    async fn query(&self, client: &ClientHandle, soql: &str) -> Result<QueryResult> {
        self.fetch(client.get(&client.query_url(soql))).await
    }

    #[instrument(skip(self, client), fields(instance = %client.instance_url()))]
    async fn query_more(&self, client: &ClientHandle, cursor: &str) -> Result<QueryResult> {
        self.fetch(client.get(&client.cursor_url(cursor)?)).await
    }
}

impl std::fmt::Debug for RestQuerySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestQuerySource").finish_non_exhaustive()
    }
}
