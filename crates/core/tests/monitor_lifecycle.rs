//! Monitor lifecycle integration tests.
//!
//! These tests drive torrents through the monitor:
//! active -> condemned -> replaced | abandoned

use std::sync::Arc;
use std::time::Duration;

use seedkeeper_core::{
    config::{FilterConfig, MonitorConfig},
    testing::{fixtures, MockLibraryNotifier, MockSource, MockTorrentClient},
    Aggregator, DownloadMonitor, MetadataWait, MonitorController, ReplacementOutcome,
    SourceAdapter, Stores, SubmissionPolicy,
};

/// Test helper wiring mocks into a monitor.
struct TestHarness {
    client: Arc<MockTorrentClient>,
    source: Arc<MockSource>,
    library: Arc<MockLibraryNotifier>,
    stores: Stores,
    controller: MonitorController,
}

impl TestHarness {
    fn new() -> Self {
        let client = Arc::new(MockTorrentClient::new());
        let source = Arc::new(MockSource::new("leetx"));
        let library = Arc::new(MockLibraryNotifier::new());
        let stores = Stores::in_memory();

        let sources: Vec<Arc<dyn SourceAdapter>> = vec![source.clone()];
        let aggregator = Arc::new(Aggregator::new(
            sources,
            stores.blacklist.clone(),
            FilterConfig::default(),
            50,
        ));
        let submission = SubmissionPolicy::new(
            client.clone(),
            stores.history.clone(),
            FilterConfig::default(),
            MetadataWait {
                settle_delay: Duration::ZERO,
                attempts: 2,
                retry_delay: Duration::from_millis(5),
            },
        );
        let config = MonitorConfig {
            min_seeds: 2,
            min_download_speed_kb: 10,
            ..Default::default()
        };
        let monitor = DownloadMonitor::new(
            client.clone(),
            aggregator,
            submission,
            stores.blacklist.clone(),
            &config,
        )
        .with_notifier(library.clone());
        let controller =
            MonitorController::with_interval(Arc::new(monitor), Duration::from_millis(25));

        Self {
            client,
            source,
            library,
            stores,
            controller,
        }
    }
}

#[tokio::test]
async fn test_stalled_torrent_replaced_end_to_end() {
    let h = TestHarness::new();
    let stalled = fixtures::hash(1);
    h.client
        .add_mock_torrent(fixtures::status(&stalled, "Show S01E01", "stalledDL", 0, 6, 0.3))
        .await;

    let alternative = fixtures::record("Show S01E01 1080p", 40, 1.2, "leetx");
    h.source.set_results(vec![alternative.clone()]).await;
    h.source
        .set_details(&alternative.locator, fixtures::details_for("Show S01E01 1080p", 2))
        .await;
    h.client
        .set_files(
            &fixtures::hash(2),
            vec![
                fixtures::file(0, "Show.S01E01.1080p.mkv"),
                fixtures::file(1, "RARBG.txt"),
            ],
            0,
        )
        .await;

    let report = h.controller.tick().await.unwrap();
    assert_eq!(report.condemned.len(), 1);
    assert_eq!(report.condemned[0].hash, stalled);
    assert!(matches!(
        &report.condemned[0].outcome,
        ReplacementOutcome::Replaced { hash, .. } if hash == &fixtures::hash(2)
    ));

    assert!(h.stores.blacklist.contains(&stalled));
    assert!(!h.client.has_torrent(&stalled).await);
    assert!(h.client.has_torrent(&fixtures::hash(2)).await);
    assert_eq!(h.stores.history.len(), 1);

    // The file-priority step runs in the background.
    for _ in 0..100 {
        if !h.client.priority_changes().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let changes = h.client.priority_changes().await;
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].file_ids, vec![1]);
}

#[tokio::test]
async fn test_condemned_movie_without_alternatives_submits_nothing() {
    let h = TestHarness::new();
    let hash = fixtures::hash(5);
    h.client
        .add_mock_torrent(fixtures::status(&hash, "Movie X", "error", 0, 0, 0.05))
        .await;

    let report = h.controller.tick().await.unwrap();
    assert_eq!(report.condemned[0].outcome, ReplacementOutcome::Abandoned);
    assert!(h.client.added_torrents().await.is_empty());
    assert!(h.stores.history.is_empty());
    assert_eq!(h.stores.blacklist.hashes(), vec![hash]);

    let status = h.controller.status();
    assert_eq!(status.stats.condemned, 1);
    assert_eq!(status.stats.abandoned, 1);
}

#[tokio::test]
async fn test_background_loop_condemns_and_notifies() {
    let h = TestHarness::new();
    h.client
        .add_mock_torrent(fixtures::status(&fixtures::hash(1), "Slow", "downloading", 100, 5, 0.2))
        .await;
    h.client
        .add_mock_torrent(fixtures::status(&fixtures::hash(2), "Done", "uploading", 0, 0, 1.0))
        .await;

    h.controller.start().await;
    h.library.wait_for_calls(1).await;
    for _ in 0..100 {
        if h.controller.status().stats.ticks >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    h.controller.stop().await;

    assert!(h.stores.blacklist.contains(&fixtures::hash(1)));
    assert!(!h.stores.blacklist.contains(&fixtures::hash(2)));
    // Completed torrents are announced once, however many passes ran.
    assert_eq!(h.library.calls().await.len(), 1);
    assert!(!h.controller.status().running);
}
