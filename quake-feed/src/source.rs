use crate::{error::FeedError, query::FeedQuery, raw::RawRecord};
use async_trait::async_trait;

/// Anything that can answer feed queries: the live HTTP client, or a fixture.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every raw record matching `query`. One request, no retries.
    async fn fetch(&self, query: &FeedQuery) -> Result<Vec<RawRecord>, FeedError>;

    /// Lightweight reachability check with a short timeout.
    async fn probe(&self) -> Result<(), FeedError>;
}
