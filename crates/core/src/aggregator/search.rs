use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::FilterConfig;
use crate::metrics;
use crate::source::{ResultRecord, SourceAdapter, SourceError};
use crate::store::Blacklist;

use super::filter::{has_media_payload, matches_quality, within_size};
use super::{SearchOutcome, SearchRequest};

/// Detail pages fetched in parallel per source.
const DETAIL_CONCURRENCY: usize = 4;

/// Fans a query out to every source and merges the results into one ranked list.
pub struct Aggregator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    blacklist: Arc<Blacklist>,
    filters: FilterConfig,
    max_results: usize,
}

impl Aggregator {
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        blacklist: Arc<Blacklist>,
        filters: FilterConfig,
        max_results: usize,
    ) -> Self {
        Self {
            sources,
            blacklist,
            filters,
            max_results,
        }
    }

    /// Names of the configured sources.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run a search.
    ///
    /// Sources are queried concurrently; a failing source contributes nothing
    /// and is reported in `source_errors`. Results come back sorted by seeds
    /// (descending, stable) with blacklisted hashes removed.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        metrics::SEARCHES_TOTAL.inc();

        let query = request.query.trim();
        let mut source_errors: HashMap<String, String> = HashMap::new();

        let selected: Vec<&Arc<dyn SourceAdapter>> = match &request.sources {
            Some(wanted) => {
                for name in wanted {
                    if !self.sources.iter().any(|s| s.name() == name) {
                        source_errors.insert(name.clone(), "unknown source".to_string());
                    }
                }
                self.sources
                    .iter()
                    .filter(|s| wanted.iter().any(|w| w == s.name()))
                    .collect()
            }
            None => self.sources.iter().collect(),
        };

        if query.is_empty() || selected.is_empty() {
            return SearchOutcome {
                results: Vec::new(),
                source_errors,
            };
        }

        debug!(
            sources = ?selected.iter().map(|s| s.name()).collect::<Vec<_>>(),
            query = %query,
            "Starting parallel search"
        );

        let search_futures: Vec<_> = selected
            .into_iter()
            .map(|source| async move {
                let result = self.collect_from(&**source, query).await;
                (source.name().to_string(), result)
            })
            .collect();

        let results = futures::future::join_all(search_futures).await;

        let mut pool: Vec<ResultRecord> = Vec::new();
        for (source, result) in results {
            match result {
                Ok(mut records) => pool.append(&mut records),
                Err(e) => {
                    warn!(source = %source, error = %e, "Source search failed");
                    metrics::SOURCE_FAILURES.with_label_values(&[source.as_str()]).inc();
                    source_errors.insert(source, e.to_string());
                }
            }
        }

        let pooled = pool.len();
        let results = self.rank(pool, request);

        metrics::SEARCH_RESULTS.observe(results.len() as f64);
        info!(
            query = %query,
            pooled = pooled,
            results = results.len(),
            failed_sources = source_errors.len(),
            "Search complete"
        );

        SearchOutcome {
            results,
            source_errors,
        }
    }

    /// Search one source and fill in each hit's detail-page data.
    async fn collect_from(
        &self,
        source: &dyn SourceAdapter,
        query: &str,
    ) -> Result<Vec<ResultRecord>, SourceError> {
        let hits = source.search(query, self.max_results).await?;

        let records: Vec<ResultRecord> = futures::stream::iter(hits)
            .map(|mut record| async move {
                match source.fetch_details(&record.locator).await {
                    Ok(details) => record.apply_details(details),
                    Err(e) => {
                        debug!(
                            source = source.name(),
                            locator = %record.locator,
                            error = %e,
                            "Failed to fetch details"
                        );
                    }
                }
                record
            })
            .buffered(DETAIL_CONCURRENCY)
            .collect()
            .await;

        Ok(records)
    }

    /// Filter, drop blacklisted hashes and sort by seeds.
    fn rank(&self, pool: Vec<ResultRecord>, request: &SearchRequest) -> Vec<ResultRecord> {
        let min = request.min_size_gb.unwrap_or(self.filters.default_min_size_gb);
        let max = request.max_size_gb.unwrap_or(self.filters.default_max_size_gb);
        let aliases = request
            .quality
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| self.quality_aliases(q));

        let mut results: Vec<ResultRecord> = pool
            .into_iter()
            .filter(|r| within_size(r, min, max))
            .filter(|r| aliases.as_ref().is_none_or(|a| matches_quality(&r.name, a)))
            .filter(|r| has_media_payload(r, &self.filters.media_extensions))
            .filter(|r| {
                r.hash
                    .as_deref()
                    .is_none_or(|hash| !self.blacklist.contains(hash))
            })
            .collect();

        // sort_by is stable: equal seed counts keep arrival order.
        results.sort_by(|a, b| b.seeds.cmp(&a.seeds));
        results
    }

    /// Aliases for a quality tier. An unknown tier matches its own name.
    fn quality_aliases(&self, tier: &str) -> Vec<String> {
        self.filters
            .quality_keywords
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(tier))
            .map(|(_, aliases)| aliases.clone())
            .unwrap_or_else(|| vec![tier.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Stores;
    use crate::testing::{fixtures, MockSource};

    fn aggregator(sources: Vec<Arc<dyn SourceAdapter>>, blacklist: Arc<Blacklist>) -> Aggregator {
        Aggregator::new(sources, blacklist, FilterConfig::default(), 50)
    }

    #[tokio::test]
    async fn test_results_sorted_by_seeds_stable() {
        let source = MockSource::new("a");
        source
            .set_results(vec![
                fixtures::record("first", 10, 1.0, "a"),
                fixtures::record("second", 30, 1.0, "a"),
                fixtures::record("third", 10, 1.0, "a"),
            ])
            .await;
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("q")).await;
        let names: Vec<_> = outcome.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first", "third"]);
    }

    #[tokio::test]
    async fn test_details_populate_magnet_and_hash() {
        let source = MockSource::new("a");
        let record = fixtures::record("Show", 5, 1.0, "a");
        source.set_results(vec![record.clone()]).await;
        source.set_details(&record.locator, fixtures::details_for("Show", 1)).await;
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("Show")).await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].hash.as_deref(), Some(fixtures::hash(1).as_str()));
        assert!(outcome.results[0].magnet.is_some());
    }

    #[tokio::test]
    async fn test_blacklisted_hash_excluded() {
        let source = MockSource::new("a");
        let first = fixtures::record("Show A", 5, 1.0, "a");
        let second = fixtures::record("Show B", 5, 1.0, "a");
        source.set_results(vec![first.clone(), second.clone()]).await;
        source.set_details(&first.locator, fixtures::details_for("Show A", 1)).await;
        source.set_details(&second.locator, fixtures::details_for("Show B", 2)).await;

        let stores = Stores::in_memory();
        stores.blacklist.add(&fixtures::hash(1)).unwrap();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist.clone());

        let outcome = agg.search(&SearchRequest::new("Show")).await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].name, "Show B");
    }

    #[tokio::test]
    async fn test_failing_source_isolated() {
        let good = MockSource::new("good");
        good.set_results(vec![fixtures::record("Show", 5, 1.0, "good")]).await;
        let bad = MockSource::new("bad");
        bad.set_search_error("HTTP 503").await;

        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(bad), Arc::new(good)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("Show")).await;
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.source_errors["bad"].contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty() {
        let bad = MockSource::new("bad");
        bad.set_search_error("down").await;
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(bad)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("Show")).await;
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.source_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_record_without_magnet() {
        let source = MockSource::new("a");
        source.set_results(vec![fixtures::record("Show", 5, 1.0, "a")]).await;
        source.set_details_error("timeout").await;
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("Show")).await;
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].magnet.is_none());
        assert!(outcome.results[0].hash.is_none());
    }

    #[tokio::test]
    async fn test_source_selection() {
        let a = MockSource::new("a");
        a.set_results(vec![fixtures::record("from a", 1, 1.0, "a")]).await;
        let b = MockSource::new("b");
        b.set_results(vec![fixtures::record("from b", 1, 1.0, "b")]).await;
        let b_calls = b.search_calls();

        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(a), Arc::new(b)], stores.blacklist);

        let outcome = agg
            .search(&SearchRequest::new("x").with_sources(vec!["a".into(), "nope".into()]))
            .await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].source, "a");
        assert_eq!(outcome.source_errors["nope"], "unknown source");
        assert_eq!(b_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_default_size_window_applies() {
        let source = MockSource::new("a");
        source
            .set_results(vec![
                fixtures::record("tiny", 5, 0.05, "a"),
                fixtures::record("huge", 5, 80.0, "a"),
                fixtures::record("ok", 5, 4.0, "a"),
            ])
            .await;
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("x")).await;
        let names: Vec<_> = outcome.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_unknown_quality_matches_literal() {
        let source = MockSource::new("a");
        source
            .set_results(vec![
                fixtures::record("Movie REMUX", 5, 1.0, "a"),
                fixtures::record("Movie WEB", 5, 1.0, "a"),
            ])
            .await;
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist);

        let outcome = agg
            .search(&SearchRequest::new("Movie").with_quality("remux"))
            .await;
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].name, "Movie REMUX");
    }

    #[tokio::test]
    async fn test_blank_query_skips_sources() {
        let source = MockSource::new("a");
        let calls = source.search_calls();
        let stores = Stores::in_memory();
        let agg = aggregator(vec![Arc::new(source)], stores.blacklist);

        let outcome = agg.search(&SearchRequest::new("   ")).await;
        assert!(outcome.results.is_empty());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
