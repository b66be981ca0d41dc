//! Prometheus metrics for core components.
//!
//! - Search fan-out (searches, per-source failures, result counts)
//! - Submissions
//! - Monitor passes (ticks, condemnations, replacements)
//! - Media library notifications

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Search Metrics
// =============================================================================

/// Aggregated searches total.
pub static SEARCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("seedkeeper_searches_total", "Total aggregated searches").unwrap()
});

/// Source adapter failures by source.
pub static SOURCE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedkeeper_source_failures_total",
            "Total source adapter search failures",
        ),
        &["source"],
    )
    .unwrap()
});

/// Results returned per aggregated search, after filtering.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "seedkeeper_search_results",
            "Number of results returned per aggregated search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
    )
    .unwrap()
});

// =============================================================================
// Submission Metrics
// =============================================================================

/// Submissions by result.
pub static SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seedkeeper_submissions_total", "Total torrent submissions"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Files marked as skipped by the file-priority policy.
pub static FILES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seedkeeper_files_skipped_total",
        "Total non-media files set to skip",
    )
    .unwrap()
});

// =============================================================================
// Monitor Metrics
// =============================================================================

/// Monitor passes total.
pub static MONITOR_TICKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("seedkeeper_monitor_ticks_total", "Total monitor passes").unwrap()
});

/// Condemnations by reason.
pub static CONDEMNATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedkeeper_condemnations_total",
            "Total torrents condemned by the monitor",
        ),
        &["reason"], // "error_state", "stalled", "low_seeds", "low_speed"
    )
    .unwrap()
});

/// Replacement outcomes.
pub static REPLACEMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedkeeper_replacements_total",
            "Outcome of replacing condemned torrents",
        ),
        &["outcome"], // "replaced", "abandoned", "failed"
    )
    .unwrap()
});

// =============================================================================
// Media Library Metrics
// =============================================================================

/// Library rescan notifications by result.
pub static LIBRARY_NOTIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seedkeeper_library_notifications_total",
            "Total media library rescan requests",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SOURCE_FAILURES.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        // Submission
        Box::new(SUBMISSIONS_TOTAL.clone()),
        Box::new(FILES_SKIPPED.clone()),
        // Monitor
        Box::new(MONITOR_TICKS.clone()),
        Box::new(CONDEMNATIONS.clone()),
        Box::new(REPLACEMENTS.clone()),
        // Media library
        Box::new(LIBRARY_NOTIFICATIONS.clone()),
    ]
}
