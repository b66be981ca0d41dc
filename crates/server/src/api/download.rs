//! Magnet submission API handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use seedkeeper_core::SubmissionError;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    #[serde(default)]
    pub magnet_link: Option<String>,
    /// Name of the source the magnet came from.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub success: bool,
    pub hash: String,
    pub name: String,
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/download
///
/// Submit a magnet to the download client and record it in history.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DownloadBody>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let magnet = match body.magnet_link.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "magnet_link is required")),
    };

    let receipt = state
        .submission()
        .submit(
            magnet,
            body.source.as_deref().unwrap_or_default(),
            body.name.as_deref(),
        )
        .await
        .map_err(|e| match e {
            SubmissionError::InvalidMagnet(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
            SubmissionError::Client(_) => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
        })?;

    let message = if receipt.history_saved {
        "Torrent added".to_string()
    } else {
        "Torrent added, but the history entry could not be saved".to_string()
    };

    Ok(Json(DownloadResponse {
        success: true,
        hash: receipt.hash,
        name: receipt.name,
        message,
    }))
}
