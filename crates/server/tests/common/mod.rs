//! Common test utilities for API testing with mocks.
//!
//! Builds the full router in-process with a mock source and a mock
//! download client, and JSON stores in a temporary directory.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use seedkeeper_core::{
    load_config_from_str,
    testing::{MockSource, MockTorrentClient},
    SourceAdapter, Stores, TorrentClient,
};
use seedkeeper_server::state::AppState;

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use seedkeeper_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[torrent_client]
url = "http://127.0.0.1:8080"
username = "admin"
password = "secret"

[monitor]
interval_secs = 3600
min_seeds = 2
min_download_speed_kb = 10
settle_delay_ms = 0
metadata_attempts = 1
metadata_retry_ms = 0
"#;

/// Test fixture with an in-process router and controllable mocks.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/v1/health").await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
#[allow(dead_code)]
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock "leetx" source - configure search results
    pub source: Arc<MockSource>,
    /// Mock download client
    pub torrent_client: Arc<MockTorrentClient>,
    pub state: Arc<AppState>,
    pub stores: Stores,
    /// Holds the blacklist and history files
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

#[allow(dead_code)]
impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");
        config.storage.blacklist_path = temp_dir.path().join("blacklist.json");
        config.storage.history_path = temp_dir.path().join("history.json");

        let stores = Stores::open(&config.storage).expect("Failed to open stores");
        let source = Arc::new(MockSource::new("leetx"));
        let torrent_client = Arc::new(MockTorrentClient::new());

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&torrent_client) as Arc<dyn TorrentClient>,
            vec![Arc::clone(&source) as Arc<dyn SourceAdapter>],
            stores.clone(),
            None,
        ));
        let router = seedkeeper_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            source,
            torrent_client,
            state,
            stores,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
