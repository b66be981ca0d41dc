//! HTTP API integration tests.
//!
//! Drives the in-process router against a mock source and a mock
//! download client.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{fixtures, TestFixture};

// =============================================================================
// Health and config
// =============================================================================

#[tokio::test]
async fn test_health_returns_ok() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_password() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["torrent_client"]["password_configured"], true);
    assert!(response.body["torrent_client"].get("password").is_none());
    assert!(!response.text.contains("secret"));
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_requires_query() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/search", json!({ "query": "  " })).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert!(response.body["error"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn test_search_filters_by_quality_and_size() {
    let fixture = TestFixture::new().await;
    let hd = fixtures::record("Show S01E01 1080p", 50, 1.2, "leetx");
    let sd = fixtures::record("Show S01E01 720p", 5, 0.8, "leetx");
    fixture.source.set_results(vec![hd.clone(), sd.clone()]).await;
    fixture
        .source
        .set_details(&hd.locator, fixtures::details_for("Show S01E01 1080p", 1))
        .await;
    fixture
        .source
        .set_details(&sd.locator, fixtures::details_for("Show S01E01 720p", 2))
        .await;

    let response = fixture
        .post(
            "/api/v1/search",
            json!({ "query": "Show S01E01", "quality": "1080p", "min_size": 1.0 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["count"], 1);
    assert_eq!(response.body["results"][0]["name"], "Show S01E01 1080p");
    assert_eq!(response.body["results"][0]["hash"], fixtures::hash(1));
    assert!(response.body["results"][0]["magnet"]
        .as_str()
        .unwrap()
        .starts_with("magnet:?"));
}

#[tokio::test]
async fn test_search_reports_failing_source() {
    let fixture = TestFixture::new().await;
    fixture.source.set_search_error("HTTP 503").await;

    let response = fixture.post("/api/v1/search", json!({ "query": "Show" })).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["count"], 0);
    assert!(response.body["source_errors"]["leetx"]
        .as_str()
        .unwrap()
        .contains("503"));
}

#[tokio::test]
async fn test_search_skips_blacklisted_hash() {
    let fixture = TestFixture::new().await;
    let record = fixtures::record("Movie X", 30, 2.0, "leetx");
    fixture.source.set_results(vec![record.clone()]).await;
    fixture
        .source
        .set_details(&record.locator, fixtures::details_for("Movie X", 4))
        .await;
    fixture.stores.blacklist.add(&fixtures::hash(4)).unwrap();

    let response = fixture.post("/api/v1/search", json!({ "query": "Movie X" })).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 0);
}

// =============================================================================
// Download
// =============================================================================

#[tokio::test]
async fn test_download_requires_magnet() {
    let fixture = TestFixture::new().await;

    let response = fixture.post("/api/v1/download", json!({ "name": "Show" })).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert!(fixture.torrent_client.added_torrents().await.is_empty());
}

#[tokio::test]
async fn test_download_rejects_non_magnet() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/download",
            json!({ "magnet_link": "http://example.com/file.torrent" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(fixture.stores.history.is_empty());
}

#[tokio::test]
async fn test_download_submits_and_records_history() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/download",
            json!({
                "magnet_link": fixtures::magnet(7, "Show S01E01"),
                "source": "leetx",
                "name": "Show S01E01",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["hash"], fixtures::hash(7));
    assert_eq!(response.body["name"], "Show S01E01");

    let added = fixture.torrent_client.added_torrents().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].request.tags, vec!["leetx".to_string()]);

    let history = fixture.get("/api/v1/history").await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body["count"], 1);
    assert_eq!(history.body["entries"][0]["hash"], fixtures::hash(7));
    assert_eq!(history.body["entries"][0]["source"], "leetx");
}

#[tokio::test]
async fn test_download_client_failure_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    fixture
        .torrent_client
        .set_next_error(seedkeeper_core::TorrentClientError::ConnectionFailed(
            "refused".to_string(),
        ))
        .await;

    let response = fixture
        .post(
            "/api/v1/download",
            json!({ "magnet_link": fixtures::magnet(8, "Movie") }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["success"], false);
    assert!(fixture.stores.history.is_empty());
}

// =============================================================================
// Torrents
// =============================================================================

#[tokio::test]
async fn test_list_and_get_torrents() {
    let fixture = TestFixture::new().await;
    let hash = fixtures::hash(1);
    fixture
        .torrent_client
        .add_mock_torrent(fixtures::status(&hash, "Show", "downloading", 500_000, 8, 0.4))
        .await;

    let list = fixture.get("/api/v1/torrents").await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["count"], 1);

    let one = fixture.get(&format!("/api/v1/torrents/{}", hash)).await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["torrent"]["name"], "Show");

    let missing = fixture
        .get(&format!("/api/v1/torrents/{}", fixtures::hash(99)))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["success"], false);
}

#[tokio::test]
async fn test_delete_torrent_passes_delete_files_flag() {
    let fixture = TestFixture::new().await;
    let hash = fixtures::hash(2);
    fixture
        .torrent_client
        .add_mock_torrent(fixtures::status(&hash, "Movie", "downloading", 500_000, 8, 0.4))
        .await;

    let response = fixture
        .delete(&format!("/api/v1/torrents/{}?delete_files=true", hash))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let removals = fixture.torrent_client.removals().await;
    assert_eq!(removals.len(), 1);
    assert!(removals[0].delete_files);
    assert!(!fixture.torrent_client.has_torrent(&hash).await);
}

#[tokio::test]
async fn test_lifecycle_actions() {
    let fixture = TestFixture::new().await;
    let hash = fixtures::hash(3);
    fixture
        .torrent_client
        .add_mock_torrent(fixtures::status(&hash, "Show", "downloading", 500_000, 8, 0.4))
        .await;

    for action in ["pause", "resume", "recheck"] {
        let response = fixture
            .post_empty(&format!("/api/v1/torrents/{}/{}", hash, action))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{} failed", action);
    }

    let actions: Vec<String> = fixture
        .torrent_client
        .actions()
        .await
        .into_iter()
        .map(|(action, _)| action)
        .collect();
    assert_eq!(actions, vec!["pause", "resume", "recheck"]);

    let unknown = fixture
        .post_empty(&format!("/api/v1/torrents/{}/pause", fixtures::hash(42)))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Blacklist
// =============================================================================

#[tokio::test]
async fn test_blacklist_list_and_idempotent_remove() {
    let fixture = TestFixture::new().await;
    fixture.stores.blacklist.add(&fixtures::hash(5)).unwrap();

    let list = fixture.get("/api/v1/blacklist").await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["hashes"], json!([fixtures::hash(5)]));

    let first = fixture
        .delete(&format!("/api/v1/blacklist/{}", fixtures::hash(5)))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["removed"], true);

    let second = fixture
        .delete(&format!("/api/v1/blacklist/{}", fixtures::hash(5)))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["removed"], false);

    assert!(fixture.stores.blacklist.is_empty());
}

// =============================================================================
// Monitor
// =============================================================================

#[tokio::test]
async fn test_monitor_start_stop_status() {
    let fixture = TestFixture::new().await;

    let status = fixture.get("/api/v1/monitor/status").await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["running"], false);
    assert_eq!(status.body["interval_secs"], 3600);

    let started = fixture.post_empty("/api/v1/monitor/start").await;
    assert_eq!(started.body["running"], true);
    let again = fixture.post_empty("/api/v1/monitor/start").await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["running"], true);

    let stopped = fixture.post_empty("/api/v1/monitor/stop").await;
    assert_eq!(stopped.body["running"], false);
    let again = fixture.post_empty("/api/v1/monitor/stop").await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["running"], false);
}

#[tokio::test]
async fn test_monitor_tick_condemns_stalled_torrent() {
    let fixture = TestFixture::new().await;
    let hash = fixtures::hash(6);
    fixture
        .torrent_client
        .add_mock_torrent(fixtures::status(&hash, "Movie X", "stalledDL", 0, 0, 0.1))
        .await;

    let response = fixture.post_empty("/api/v1/monitor/tick").await;

    assert_eq!(response.status, StatusCode::OK);
    let condemned = &response.body["report"]["condemned"];
    assert_eq!(condemned.as_array().unwrap().len(), 1);
    assert_eq!(condemned[0]["hash"], hash);
    assert_eq!(condemned[0]["reason"], "stalled");
    assert_eq!(condemned[0]["outcome"], "abandoned");

    assert!(fixture.stores.blacklist.contains(&hash));
    assert!(fixture.torrent_client.added_torrents().await.is_empty());

    let status = fixture.get("/api/v1/monitor/status").await;
    assert_eq!(status.body["ticks"], 1);
    assert_eq!(status.body["abandoned"], 1);
}

#[tokio::test]
async fn test_monitor_tick_reports_client_failure() {
    let fixture = TestFixture::new().await;
    fixture
        .torrent_client
        .set_next_error(seedkeeper_core::TorrentClientError::ConnectionFailed(
            "refused".to_string(),
        ))
        .await;

    let response = fixture.post_empty("/api/v1/monitor/tick").await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["success"], false);
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("seedkeeper_http_requests_total"));
    assert!(response.text.contains("seedkeeper_monitor_running"));
}
