use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{blacklist, download, handlers, monitor, search, torrents};
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Search and submission
        .route("/search", post(search::search))
        .route("/download", post(download::download))
        // Torrent client
        .route("/torrents", get(torrents::list_torrents))
        .route("/torrents/{hash}", get(torrents::get_torrent))
        .route("/torrents/{hash}", delete(torrents::remove_torrent))
        .route("/torrents/{hash}/pause", post(torrents::pause_torrent))
        .route("/torrents/{hash}/resume", post(torrents::resume_torrent))
        .route("/torrents/{hash}/recheck", post(torrents::recheck_torrent))
        // Blacklist and history
        .route("/blacklist", get(blacklist::list_blacklist))
        .route("/blacklist/{hash}", delete(blacklist::remove_from_blacklist))
        .route("/history", get(blacklist::list_history))
        // Monitor loop
        .route("/monitor/start", post(monitor::start_monitor))
        .route("/monitor/stop", post(monitor::stop_monitor))
        .route("/monitor/status", get(monitor::get_status))
        .route("/monitor/tick", post(monitor::run_tick));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
