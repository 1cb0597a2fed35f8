//! Lazy, pull-based iteration over a paginated query
//!
//! A [`QueryStream`] holds the records of the page it fetched last plus what
//! to do once they run out: fetch the next cursor, report an error, or stop.
//! Nothing happens between pulls.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::Arc;

use forcelink_domain::{ClientHandle, ForceLinkError, QueryResult, Record, Result};
use futures::stream::{self, Stream};
use tracing::{debug, warn};

use super::ports::PageSource;

enum PaginationState {
    /// The first page has not been requested yet.
    Ready(String),
    /// Pending records drained, then fetch this cursor.
    Continue(String),
    /// Pending records drained, then yield this error.
    Failed(ForceLinkError),
    Halted,
}

/// Single-use sequence of the records of every page of one query.
///
/// Each item is `Ok(record)` until the last page is drained, or one `Err`
/// if a fetch fails, after which the stream is halted for good. Only a
/// page's `done` flag ends the stream; `total_size` is reported but never
/// trusted.
///
/// Dropping the stream is always safe. Dropping a pending
/// [`next`](Self::next) future loses nothing: the next pull reissues the
/// request that was in flight.
pub struct QueryStream {
    source: Arc<dyn PageSource>,
    client: ClientHandle,
    pending: VecDeque<Record>,
    state: PaginationState,
    pages_fetched: usize,
    total_size: Option<u64>,
}

impl QueryStream {
    /// A stream that issues `soql` on its first pull.
    pub fn start(source: Arc<dyn PageSource>, client: ClientHandle, soql: impl Into<String>) -> Self {
        Self::with_state(source, client, PaginationState::Ready(soql.into()))
    }

    /// A stream seeded with a page the caller already fetched.
    pub fn from_result(source: Arc<dyn PageSource>, client: ClientHandle, first: QueryResult) -> Self {
        let mut stream = Self::with_state(source, client, PaginationState::Halted);
        stream.absorb(first);
        stream
    }

    fn with_state(source: Arc<dyn PageSource>, client: ClientHandle, state: PaginationState) -> Self {
        Self { source, client, pending: VecDeque::new(), state, pages_fetched: 0, total_size: None }
    }

    /// Pull the next record.
    ///
    /// Returns `None` once the stream is exhausted or has yielded its error.
    /// Records already fetched are returned without any I/O.
    pub async fn next(&mut self) -> Option<Result<Record>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }

            // The state is only replaced once the fetch resolves, so a
            // cancelled pull leaves the same request to be retried.
            let page = match &self.state {
                PaginationState::Halted => return None,
                PaginationState::Failed(_) => return self.take_failure(),
                PaginationState::Ready(soql) => self.source.query(&self.client, soql).await,
                PaginationState::Continue(cursor) => {
                    debug!(cursor = %cursor, page = self.pages_fetched + 1, "fetching next query page");
                    self.source.query_more(&self.client, cursor).await
                }
            };

            match page {
                Ok(page) => self.absorb(page),
                Err(err) => {
                    warn!(error = %err, pages = self.pages_fetched, "query page fetch failed");
                    self.state = PaginationState::Halted;
                    return Some(Err(err));
                }
            }
        }
    }

    fn take_failure(&mut self) -> Option<Result<Record>> {
        match mem::replace(&mut self.state, PaginationState::Halted) {
            PaginationState::Failed(err) => Some(Err(err)),
            _ => None,
        }
    }

    /// Queue a page's records and decide what follows them.
    fn absorb(&mut self, page: QueryResult) {
        self.pages_fetched += 1;
        self.total_size = Some(page.total_size);

        self.state = match page.validate() {
            Err(err) => PaginationState::Failed(err),
            Ok(()) => match page.next_cursor {
                Some(cursor) if !page.done => PaginationState::Continue(cursor),
                _ => PaginationState::Halted,
            },
        };
        self.pending.extend(page.records);
    }

    /// Pages fetched (or seeded) so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// `totalSize` reported by the most recent page.
    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    /// Whether further pulls can yield anything.
    pub fn is_halted(&self) -> bool {
        self.pending.is_empty() && matches!(self.state, PaginationState::Halted)
    }

    /// Adapt into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> + Send {
        stream::unfold(self, |mut query| async move {
            query.next().await.map(|item| (item, query))
        })
    }

    /// Drain every remaining item, error included.
    pub async fn collect_records(mut self) -> Vec<Result<Record>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        items
    }

    /// Drain every remaining record, or return the terminating error.
    pub async fn try_collect(mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }
}

impl fmt::Debug for QueryStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            PaginationState::Ready(_) => "ready",
            PaginationState::Continue(_) => "continue",
            PaginationState::Failed(_) => "failed",
            PaginationState::Halted => "halted",
        };
        f.debug_struct("QueryStream")
            .field("client", &self.client)
            .field("pending", &self.pending.len())
            .field("state", &state)
            .field("pages_fetched", &self.pages_fetched)
            .finish()
    }
}
