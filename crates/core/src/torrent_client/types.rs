//! Types for torrent client operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("Torrent rejected: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse state of a torrent, derived from the engine's raw label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    Downloading,
    Seeding,
    Paused,
    Checking,
    Queued,
    /// No peers to transfer with.
    Stalled,
    Error,
    Unknown,
}

impl TorrentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::Downloading => "downloading",
            TorrentState::Seeding => "seeding",
            TorrentState::Paused => "paused",
            TorrentState::Checking => "checking",
            TorrentState::Queued => "queued",
            TorrentState::Stalled => "stalled",
            TorrentState::Error => "error",
            TorrentState::Unknown => "unknown",
        }
    }
}

/// Live status of a torrent held by the download client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentStatus {
    /// Info hash (lowercase hex).
    pub hash: String,
    pub name: String,
    pub state: TorrentState,
    /// Raw engine state label, e.g. "stalledDL" or "missingFiles".
    pub state_label: String,
    /// Download progress (0.0 - 1.0).
    pub progress: f64,
    pub size_bytes: u64,
    /// Current download speed in bytes/second.
    pub download_speed: u64,
    /// Current upload speed in bytes/second.
    pub upload_speed: u64,
    /// Connected seeds.
    pub seeds: u32,
    /// Connected leechers.
    pub leeches: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TorrentStatus {
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }
}

/// Download priority of a single file inside a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePriority {
    /// Do not download.
    Skip,
    Normal,
    High,
    Maximum,
}

impl FilePriority {
    /// qBittorrent's numeric priority.
    pub fn as_qb(&self) -> u8 {
        match self {
            FilePriority::Skip => 0,
            FilePriority::Normal => 1,
            FilePriority::High => 6,
            FilePriority::Maximum => 7,
        }
    }

    pub fn from_qb(value: i64) -> Self {
        match value {
            0 => FilePriority::Skip,
            6 => FilePriority::High,
            7 => FilePriority::Maximum,
            _ => FilePriority::Normal,
        }
    }
}

/// One file inside a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentFile {
    /// Index used when changing the file's priority.
    pub index: u32,
    /// Path relative to the torrent root.
    pub name: String,
    pub size_bytes: u64,
    pub progress: f64,
    pub priority: FilePriority,
}

/// Request to add a torrent by magnet.
#[derive(Debug, Clone)]
pub struct AddTorrentRequest {
    pub magnet: String,
    pub tags: Vec<String>,
    pub download_path: Option<String>,
    pub category: Option<String>,
    pub paused: bool,
}

impl AddTorrentRequest {
    /// Create a magnet request with default options.
    pub fn magnet(uri: impl Into<String>) -> Self {
        Self {
            magnet: uri.into(),
            tags: Vec::new(),
            download_path: None,
            category: None,
            paused: false,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_download_path(mut self, path: impl Into<String>) -> Self {
        self.download_path = Some(path.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash of the added torrent.
    pub hash: String,
    /// Name of the torrent (often unknown for magnets until metadata arrives).
    pub name: Option<String>,
}

/// Trait for download client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Submit a magnet.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;

    /// List every torrent the client holds.
    async fn list_torrents(&self) -> Result<Vec<TorrentStatus>, TorrentClientError>;

    /// Get a single torrent, `None` if the client does not know the hash.
    async fn get_torrent(&self, hash: &str) -> Result<Option<TorrentStatus>, TorrentClientError>;

    /// List the files of a torrent. Empty until metadata is resolved.
    async fn torrent_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError>;

    /// Change the priority of the given file indices.
    async fn set_file_priority(
        &self,
        hash: &str,
        file_ids: &[u32],
        priority: FilePriority,
    ) -> Result<(), TorrentClientError>;

    async fn pause_torrent(&self, hash: &str) -> Result<(), TorrentClientError>;

    async fn resume_torrent(&self, hash: &str) -> Result<(), TorrentClientError>;

    /// Remove a torrent, optionally deleting its downloaded data.
    async fn remove_torrent(&self, hash: &str, delete_files: bool)
        -> Result<(), TorrentClientError>;

    /// Re-verify downloaded data.
    async fn recheck_torrent(&self, hash: &str) -> Result<(), TorrentClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_state_serialization() {
        assert_eq!(
            serde_json::to_string(&TorrentState::Downloading).unwrap(),
            "\"downloading\""
        );
        assert_eq!(TorrentState::Stalled.as_str(), "stalled");
    }

    #[test]
    fn test_file_priority_round_trip_qb_values() {
        for priority in [
            FilePriority::Skip,
            FilePriority::Normal,
            FilePriority::High,
            FilePriority::Maximum,
        ] {
            assert_eq!(FilePriority::from_qb(priority.as_qb() as i64), priority);
        }
        assert_eq!(FilePriority::from_qb(4), FilePriority::Normal);
    }

    #[test]
    fn test_add_torrent_request_builder() {
        let req = AddTorrentRequest::magnet("magnet:?xt=urn:btih:abc")
            .with_tag("leetx")
            .with_download_path("/downloads")
            .with_category("tv")
            .with_paused(true);

        assert_eq!(req.magnet, "magnet:?xt=urn:btih:abc");
        assert_eq!(req.tags, vec!["leetx".to_string()]);
        assert_eq!(req.download_path.as_deref(), Some("/downloads"));
        assert_eq!(req.category.as_deref(), Some("tv"));
        assert!(req.paused);
    }

    #[test]
    fn test_status_is_complete() {
        let mut status = TorrentStatus {
            hash: "abc".to_string(),
            name: "Show".to_string(),
            state: TorrentState::Downloading,
            state_label: "downloading".to_string(),
            progress: 0.99,
            size_bytes: 0,
            download_speed: 0,
            upload_speed: 0,
            seeds: 0,
            leeches: 0,
            added_at: None,
            save_path: None,
            category: None,
        };
        assert!(!status.is_complete());
        status.progress = 1.0;
        assert!(status.is_complete());
    }
}
