//! Testing utilities and mock implementations.
//!
//! Mocks for every external seam (source sites, the download client and
//! the media library) so the aggregator, submission policy and monitor can
//! be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use seedkeeper_core::testing::{fixtures, MockSource, MockTorrentClient};
//!
//! let source = MockSource::new("leetx");
//! let client = MockTorrentClient::new();
//!
//! source.set_results(vec![fixtures::record("Show S01E01", 50, 1.2, "leetx")]).await;
//! client.add_mock_torrent(fixtures::status(&fixtures::hash(1), "Show", "stalledDL", 0, 3, 0.2)).await;
//! ```

mod mock_library;
mod mock_source;
mod mock_torrent_client;

pub use mock_library::MockLibraryNotifier;
pub use mock_source::{MockSource, RecordedQuery};
pub use mock_torrent_client::{
    MockTorrentClient, RecordedAddTorrent, RecordedPriority, RecordedRemoval,
};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::source::{ResultRecord, SourceDetails};
    use crate::torrent_client::{parse_qb_state, FilePriority, TorrentFile, TorrentStatus};

    /// A deterministic 40-hex info hash.
    pub fn hash(n: u32) -> String {
        format!("{:040x}", n)
    }

    /// A magnet carrying `hash(n)` and a display name.
    pub fn magnet(n: u32, name: &str) -> String {
        format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            hash(n),
            urlencoding::encode(name)
        )
    }

    /// A listing record with no details. The locator is derived from the
    /// name so distinct names get distinct locators.
    pub fn record(name: &str, seeds: u32, size_gb: f64, source: &str) -> ResultRecord {
        let slug = name.to_lowercase().replace(' ', "-");
        let mut record = ResultRecord::new(name, format!("/{}/{}", source, slug), source);
        record.seeds = seeds;
        record.leeches = seeds / 2;
        record.size_gb = size_gb;
        record
    }

    /// Detail page data: a magnet for `hash(n)` and one video file.
    pub fn details_for(name: &str, n: u32) -> SourceDetails {
        SourceDetails::from_magnet(Some(magnet(n, name)), vec![format!("{}.mkv", name)])
    }

    /// A client-side torrent status with the given raw label.
    pub fn status(
        hash: &str,
        name: &str,
        label: &str,
        download_speed: u64,
        seeds: u32,
        progress: f64,
    ) -> TorrentStatus {
        TorrentStatus {
            hash: hash.to_string(),
            name: name.to_string(),
            state: parse_qb_state(label),
            state_label: label.to_string(),
            progress,
            size_bytes: 1024 * 1024 * 1024,
            download_speed,
            upload_speed: 0,
            seeds,
            leeches: 0,
            added_at: Some(Utc::now()),
            save_path: Some("/downloads".to_string()),
            category: None,
        }
    }

    /// A file at normal priority.
    pub fn file(index: u32, name: &str) -> TorrentFile {
        TorrentFile {
            index,
            name: name.to_string(),
            size_bytes: 100 * 1024 * 1024,
            progress: 0.0,
            priority: FilePriority::Normal,
        }
    }
}
