//! Blacklist and history API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use seedkeeper_core::HistoryEntry;
use tracing::info;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BlacklistResponse {
    pub success: bool,
    pub hashes: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct BlacklistRemoveResponse {
    pub success: bool,
    /// False when the hash was not blacklisted.
    pub removed: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub entries: Vec<HistoryEntry>,
    pub count: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/blacklist
pub async fn list_blacklist(State(state): State<Arc<AppState>>) -> Json<BlacklistResponse> {
    let hashes = state.stores().blacklist.hashes();
    Json(BlacklistResponse {
        success: true,
        count: hashes.len(),
        hashes,
    })
}

/// DELETE /api/v1/blacklist/{hash}
///
/// Removing a hash that is not blacklisted succeeds with `removed: false`.
pub async fn remove_from_blacklist(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<BlacklistRemoveResponse>, ApiError> {
    let removed = state
        .stores()
        .blacklist
        .remove(&hash)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if removed {
        info!(hash = %hash, "Hash removed from blacklist");
    }

    Ok(Json(BlacklistRemoveResponse {
        success: true,
        removed,
        message: if removed {
            format!("{} removed from blacklist", hash)
        } else {
            format!("{} was not blacklisted", hash)
        },
    }))
}

/// GET /api/v1/history
///
/// Every submission, oldest first.
pub async fn list_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    let entries = state.stores().history.entries();
    Json(HistoryResponse {
        success: true,
        count: entries.len(),
        entries,
    })
}
