//! Monitor loop API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use seedkeeper_core::{MonitorStatus, TickReport};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MonitorStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub status: MonitorStatus,
}

#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub success: bool,
    pub report: TickReport,
}

/// POST /api/v1/monitor/start
///
/// Start the loop. Starting a running loop is a no-op.
pub async fn start_monitor(State(state): State<Arc<AppState>>) -> Json<MonitorStatusResponse> {
    state.monitor().start().await;
    status_response(&state)
}

/// POST /api/v1/monitor/stop
///
/// Stop the loop. Stopping a stopped loop is a no-op.
pub async fn stop_monitor(State(state): State<Arc<AppState>>) -> Json<MonitorStatusResponse> {
    state.monitor().stop().await;
    status_response(&state)
}

/// GET /api/v1/monitor/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<MonitorStatusResponse> {
    status_response(&state)
}

/// POST /api/v1/monitor/tick
///
/// Run one pass now, whether or not the loop is running.
pub async fn run_tick(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TickResponse>, ApiError> {
    let report = state
        .monitor()
        .tick()
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(TickResponse {
        success: true,
        report,
    }))
}

fn status_response(state: &AppState) -> Json<MonitorStatusResponse> {
    Json(MonitorStatusResponse {
        success: true,
        status: state.monitor().status(),
    })
}
