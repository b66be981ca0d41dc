//! Aggregated search API handler.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use seedkeeper_core::{ResultRecord, SearchRequest};
use tracing::debug;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub quality: Option<String>,
    /// Lower size bound in GiB.
    #[serde(default)]
    pub min_size: Option<f64>,
    /// Upper size bound in GiB.
    #[serde(default)]
    pub max_size: Option<f64>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<ResultRecord>,
    pub count: usize,
    pub source_errors: HashMap<String, String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Search every configured source and return the merged, ranked results.
/// A failing source is reported in `source_errors` without failing the call.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query is required"));
    }

    let mut request =
        SearchRequest::new(query).with_size_range(body.min_size, body.max_size);
    if let Some(quality) = body.quality.filter(|q| !q.trim().is_empty()) {
        request = request.with_quality(quality);
    }
    if let Some(sources) = body.sources.filter(|s| !s.is_empty()) {
        request = request.with_sources(sources);
    }

    debug!(query = %request.query, "Search requested");
    let outcome = state.aggregator().search(&request).await;

    Ok(Json(SearchResponse {
        success: true,
        count: outcome.results.len(),
        results: outcome.results,
        source_errors: outcome.source_errors,
    }))
}
