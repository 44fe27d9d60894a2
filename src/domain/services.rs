//! Domain service seams
//!
//! The reconciliation logic depends on a feed source through the
//! `FeedProvider` trait so tests can substitute an in-memory feed for the
//! HTTP client.

use async_trait::async_trait;

use crate::domain::feed::{FeedError, ParsedFeed};

/// Source of the external product feed.
///
/// Implementations must be fail-closed: any transport or decode problem is
/// returned as an error and the caller performs no catalog mutation.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Pull and decode the feed from `url`.
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FeedError>;
}
