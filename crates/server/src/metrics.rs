//! Prometheus metrics for the HTTP surface.
//!
//! - HTTP request metrics (latency, counts, in flight)
//! - Monitor loop state and store sizes (collected on scrape)
//! - Core metrics (search, submission, monitor), registered from
//!   `seedkeeper_core::metrics`

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "seedkeeper_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seedkeeper_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedkeeper_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// State Gauges
// =============================================================================

/// Whether the monitor loop is running (1) or stopped (0).
pub static MONITOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seedkeeper_monitor_running",
        "Whether the monitor loop is running",
    )
    .unwrap()
});

/// Blacklisted hashes.
pub static BLACKLIST_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("seedkeeper_blacklist_size", "Number of blacklisted hashes").unwrap()
});

/// History entries.
pub static HISTORY_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("seedkeeper_history_size", "Number of history entries").unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // State
    registry.register(Box::new(MONITOR_RUNNING.clone())).unwrap();
    registry.register(Box::new(BLACKLIST_SIZE.clone())).unwrap();
    registry.register(Box::new(HISTORY_SIZE.clone())).unwrap();

    // Core metrics (search, submission, monitor, media library)
    for metric in seedkeeper_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh the gauges that mirror application state.
pub fn collect_dynamic_metrics(state: &AppState) {
    MONITOR_RUNNING.set(i64::from(state.monitor().is_running()));
    BLACKLIST_SIZE.set(state.stores().blacklist.len() as i64);
    HISTORY_SIZE.set(state.stores().history.len() as i64);
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// Records request duration, count and in-flight requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}

/// Normalize a path for metric labels (info hashes become `{hash}`).
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() == 40 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
                "{hash}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
