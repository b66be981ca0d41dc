//! Mock source adapter for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::source::{ResultRecord, SourceAdapter, SourceDetails, SourceError};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub query: String,
    pub max_results: usize,
}

/// Mock implementation of the SourceAdapter trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable listings, globally or per query
/// - Return configurable detail pages per locator
/// - Simulate failing searches and detail fetches
///
/// # Example
///
/// ```rust,ignore
/// use seedkeeper_core::testing::{MockSource, fixtures};
///
/// let source = MockSource::new("leetx");
/// let record = fixtures::record("Show S01E01 1080p", 50, 1.2, "leetx");
/// source.set_results(vec![record.clone()]).await;
/// source.set_details(&record.locator, fixtures::details_for("Show S01E01", 1)).await;
///
/// let hits = source.search("Show", 10).await?;
/// assert_eq!(hits.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockSource {
    name: String,
    /// Listing returned for any query without a specific entry.
    results: Arc<RwLock<Vec<ResultRecord>>>,
    /// Listings for specific queries.
    results_by_query: Arc<RwLock<HashMap<String, Vec<ResultRecord>>>>,
    /// Detail pages by locator.
    details: Arc<RwLock<HashMap<String, SourceDetails>>>,
    /// If set, every search fails with this message.
    search_error: Arc<RwLock<Option<String>>>,
    /// If set, every detail fetch fails with this message.
    details_error: Arc<RwLock<Option<String>>>,
    /// Artificial latency before answering a search.
    delay: Arc<RwLock<Option<Duration>>>,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    search_calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Arc::new(RwLock::new(Vec::new())),
            results_by_query: Arc::new(RwLock::new(HashMap::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            search_error: Arc::new(RwLock::new(None)),
            details_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
            queries: Arc::new(RwLock::new(Vec::new())),
            search_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Listing returned for every query.
    pub async fn set_results(&self, results: Vec<ResultRecord>) {
        *self.results.write().await = results;
    }

    /// Listing returned for one exact query, overriding `set_results`.
    pub async fn set_results_for(&self, query: &str, results: Vec<ResultRecord>) {
        self.results_by_query
            .write()
            .await
            .insert(query.to_string(), results);
    }

    pub async fn set_details(&self, locator: &str, details: SourceDetails) {
        self.details
            .write()
            .await
            .insert(locator.to_string(), details);
    }

    /// Make every search fail until `clear_search_error`.
    pub async fn set_search_error(&self, message: impl Into<String>) {
        *self.search_error.write().await = Some(message.into());
    }

    pub async fn clear_search_error(&self) {
        *self.search_error.write().await = None;
    }

    /// Make every detail fetch fail.
    pub async fn set_details_error(&self, message: impl Into<String>) {
        *self.details_error.write().await = Some(message.into());
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Shared counter of `search` invocations.
    pub fn search_calls(&self) -> Arc<AtomicUsize> {
        self.search_calls.clone()
    }

    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultRecord>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.write().await.push(RecordedQuery {
            query: query.to_string(),
            max_results,
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.search_error.read().await.clone() {
            return Err(SourceError::Http(message));
        }

        let results = match self.results_by_query.read().await.get(query) {
            Some(results) => results.clone(),
            None => self.results.read().await.clone(),
        };
        Ok(results.into_iter().take(max_results).collect())
    }

    async fn fetch_details(&self, locator: &str) -> Result<SourceDetails, SourceError> {
        if let Some(message) = self.details_error.read().await.clone() {
            return Err(SourceError::Http(message));
        }

        Ok(self
            .details
            .read()
            .await
            .get(locator)
            .cloned()
            .unwrap_or_default())
    }
}
