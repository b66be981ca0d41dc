//! Download client API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use seedkeeper_core::TorrentStatus;
use tracing::info;

use super::handlers::{api_error, client_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RemoveTorrentParams {
    #[serde(default)]
    pub delete_files: bool,
}

#[derive(Debug, Serialize)]
pub struct TorrentListResponse {
    pub success: bool,
    pub torrents: Vec<TorrentStatus>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TorrentResponse {
    pub success: bool,
    pub torrent: TorrentStatus,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/torrents
///
/// List every torrent the download client holds.
pub async fn list_torrents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TorrentListResponse>, ApiError> {
    let torrents = state
        .torrent_client()
        .list_torrents()
        .await
        .map_err(client_error)?;

    Ok(Json(TorrentListResponse {
        success: true,
        count: torrents.len(),
        torrents,
    }))
}

/// GET /api/v1/torrents/{hash}
pub async fn get_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<TorrentResponse>, ApiError> {
    match state.torrent_client().get_torrent(&hash).await {
        Ok(Some(torrent)) => Ok(Json(TorrentResponse {
            success: true,
            torrent,
        })),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Torrent not found: {}", hash),
        )),
        Err(e) => Err(client_error(e)),
    }
}

/// DELETE /api/v1/torrents/{hash}?delete_files=true
///
/// Remove a torrent. Downloaded data is kept unless `delete_files` is set.
pub async fn remove_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
    Query(params): Query<RemoveTorrentParams>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .torrent_client()
        .remove_torrent(&hash, params.delete_files)
        .await
        .map_err(client_error)?;

    info!(hash = %hash, delete_files = params.delete_files, "Torrent removed via API");
    Ok(SuccessResponse::new(format!("Torrent {} removed", hash)))
}

/// POST /api/v1/torrents/{hash}/pause
pub async fn pause_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .torrent_client()
        .pause_torrent(&hash)
        .await
        .map_err(client_error)?;
    Ok(SuccessResponse::new(format!("Torrent {} paused", hash)))
}

/// POST /api/v1/torrents/{hash}/resume
pub async fn resume_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .torrent_client()
        .resume_torrent(&hash)
        .await
        .map_err(client_error)?;
    Ok(SuccessResponse::new(format!("Torrent {} resumed", hash)))
}

/// POST /api/v1/torrents/{hash}/recheck
pub async fn recheck_torrent(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .torrent_client()
        .recheck_torrent(&hash)
        .await
        .map_err(client_error)?;
    Ok(SuccessResponse::new(format!("Recheck started for {}", hash)))
}
