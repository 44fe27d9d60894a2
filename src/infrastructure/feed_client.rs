//! HTTP-backed feed provider
//!
//! Pulls the vendor feed over HTTP and maps transport problems onto the
//! domain error taxonomy. Any non-2xx status is reported as unreachable so
//! maintenance pages and auth failures can never look like an empty feed.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::domain::feed::{parse_feed, FeedError, ParsedFeed};
use crate::domain::services::FeedProvider;
use crate::infrastructure::config::FeedConfig;
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};

/// Production feed source: one GET per pull, no caching.
#[derive(Clone)]
pub struct HttpFeedClient {
    http: HttpClient,
}

impl HttpFeedClient {
    /// Build a feed client from the feed section of the app config.
    pub fn new(feed_config: &FeedConfig) -> Result<Self> {
        let http = HttpClient::with_config(HttpClientConfig::from_feed_config(feed_config))?;
        Ok(Self { http })
    }

    /// Build a feed client on top of an existing HTTP client.
    pub fn with_http_client(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FeedProvider for HttpFeedClient {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed, FeedError> {
        Url::parse(url).map_err(|e| FeedError::InvalidUrl(format!("{url}: {e}")))?;

        info!("📡 Pulling product feed from {}", url);
        let response = self
            .http
            .get(url)
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ Feed endpoint answered HTTP {} for {}", status, url);
            return Err(FeedError::Unreachable {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let feed = parse_feed(&body)?;
        info!(
            "✅ Feed pull complete: {} items ({} dropped)",
            feed.items.len(),
            feed.dropped
        );
        Ok(feed)
    }
}
