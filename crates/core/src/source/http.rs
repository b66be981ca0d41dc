//! HTTP plumbing shared by the scraping adapters.

use reqwest::Client;
use scraper::Selector;
use std::time::Duration;
use tracing::debug;

use crate::config::SourcesConfig;

use super::SourceError;

/// Fetches HTML pages with the configured user agent and timeout.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET a page and return its body as text.
    pub async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        debug!(url = url, "Fetching page");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else if e.is_connect() {
                SourceError::ConnectionFailed(e.to_string())
            } else {
                SourceError::Http(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(SourceError::Http(format!("HTTP {} for {}", response.status(), url)));
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Http(format!("Failed to read body: {}", e)))
    }
}

/// Compile a CSS selector.
pub fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("bad selector {}: {}", css, e)))
}
