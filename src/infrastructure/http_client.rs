//! HTTP client for feed retrieval
//!
//! Thin wrapper around reqwest with the transport concerns configured in one
//! place: timeout, identifying user agent, gzip and a bounded redirect
//! policy. Status handling is left to the caller so feed-specific error
//! mapping can keep the HTTP status code.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Client, ClientBuilder, Response};
use tracing::debug;

use crate::infrastructure::config::FeedConfig;

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string sent with every request
    pub user_agent: String,
    /// Whether to follow redirects (bounded to 10 hops)
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    /// Create an HttpClientConfig from the feed section of the app config
    pub fn from_feed_config(feed_config: &FeedConfig) -> Self {
        Self {
            timeout_seconds: feed_config.request_timeout_seconds,
            user_agent: feed_config.user_agent.clone(),
            follow_redirects: feed_config.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("catalog-sync/{} (internal catalog tool)", env!("CARGO_PKG_VERSION")),
            follow_redirects: true,
        }
    }
}

/// HTTP client with shared transport configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    /// Issue a single GET and return the raw response without status
    /// filtering. Callers decide how non-2xx statuses are classified.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        debug!("🌐 HTTP GET: {} (timeout {}s)", url, self.config.timeout_seconds);
        self.client.get(url).send().await
    }
}
