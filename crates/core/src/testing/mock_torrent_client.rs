//! Mock torrent client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::source::info_hash_from_magnet;
use crate::torrent_client::{
    AddTorrentRequest, AddTorrentResult, FilePriority, TorrentClient, TorrentClientError,
    TorrentFile, TorrentState, TorrentStatus,
};

/// A recorded torrent addition for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedAddTorrent {
    /// The request that was made.
    pub request: AddTorrentRequest,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// A recorded file priority change.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPriority {
    pub hash: String,
    pub file_ids: Vec<u32>,
    pub priority: FilePriority,
}

/// A recorded removal.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRemoval {
    pub hash: String,
    pub delete_files: bool,
}

#[derive(Debug, Clone)]
struct MockFiles {
    files: Vec<TorrentFile>,
    /// `torrent_files` calls that return empty before the list appears.
    hidden_polls: u32,
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Track added torrents, removals and priority changes for assertions
/// - Control torrent state, speed and seeds
/// - Delay file metadata for a number of polls
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
///
/// client.add_mock_torrent(fixtures::status(&hash, "Movie X", "stalledDL", 0, 0, 0.1)).await;
/// client.set_files(&hash, vec![fixtures::file(0, "Movie.X.mkv")], 2).await;
///
/// let removed = client.removals().await;
/// assert!(removed.is_empty());
/// ```
#[derive(Debug)]
pub struct MockTorrentClient {
    /// Recorded add_torrent calls.
    added: Arc<RwLock<Vec<RecordedAddTorrent>>>,
    /// Current torrents by hash.
    torrents: Arc<RwLock<BTreeMap<String, TorrentStatus>>>,
    files: Arc<RwLock<HashMap<String, MockFiles>>>,
    priorities: Arc<RwLock<Vec<RecordedPriority>>>,
    removals: Arc<RwLock<Vec<RecordedRemoval>>>,
    /// Pause/resume/recheck calls as `(action, hash)`.
    actions: Arc<RwLock<Vec<(String, String)>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// If set, every removal fails with this message.
    remove_error: Arc<RwLock<Option<String>>>,
    /// Counter for generating unique hashes.
    hash_counter: Arc<RwLock<u32>>,
}

impl Default for MockTorrentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self {
            added: Arc::new(RwLock::new(Vec::new())),
            torrents: Arc::new(RwLock::new(BTreeMap::new())),
            files: Arc::new(RwLock::new(HashMap::new())),
            priorities: Arc::new(RwLock::new(Vec::new())),
            removals: Arc::new(RwLock::new(Vec::new())),
            actions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            remove_error: Arc::new(RwLock::new(None)),
            hash_counter: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded add_torrent calls.
    pub async fn added_torrents(&self) -> Vec<RecordedAddTorrent> {
        self.added.read().await.clone()
    }

    pub async fn priority_changes(&self) -> Vec<RecordedPriority> {
        self.priorities.read().await.clone()
    }

    pub async fn removals(&self) -> Vec<RecordedRemoval> {
        self.removals.read().await.clone()
    }

    pub async fn actions(&self) -> Vec<(String, String)> {
        self.actions.read().await.clone()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every `remove_torrent` call fail.
    pub async fn set_remove_error(&self, message: impl Into<String>) {
        *self.remove_error.write().await = Some(message.into());
    }

    pub async fn has_torrent(&self, hash: &str) -> bool {
        self.torrents.read().await.contains_key(hash)
    }

    /// Pre-populate a torrent (for testing get/list operations).
    pub async fn add_mock_torrent(&self, status: TorrentStatus) {
        self.torrents
            .write()
            .await
            .insert(status.hash.clone(), status);
    }

    /// Set the file list of a torrent. The first `hidden_polls` calls to
    /// `torrent_files` return nothing, as if metadata were still resolving.
    pub async fn set_files(&self, hash: &str, files: Vec<TorrentFile>, hidden_polls: u32) {
        self.files.write().await.insert(
            hash.to_string(),
            MockFiles {
                files,
                hidden_polls,
            },
        );
    }

    pub async fn set_progress(&self, hash: &str, progress: f64) {
        if let Some(torrent) = self.torrents.write().await.get_mut(hash) {
            torrent.progress = progress.clamp(0.0, 1.0);
            if torrent.progress >= 1.0 {
                torrent.state = TorrentState::Seeding;
                torrent.state_label = "uploading".to_string();
            }
        }
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<TorrentClientError> {
        self.next_error.write().await.take()
    }

    /// Generate a unique 40-hex mock hash.
    async fn generate_hash(&self) -> String {
        let mut counter = self.hash_counter.write().await;
        *counter += 1;
        format!("{:040x}", 0xfeed_0000_u64 + *counter as u64)
    }

    async fn update<F>(&self, hash: &str, f: F) -> Result<(), TorrentClientError>
    where
        F: FnOnce(&mut TorrentStatus),
    {
        match self.torrents.write().await.get_mut(hash) {
            Some(torrent) => {
                f(torrent);
                Ok(())
            }
            None => Err(TorrentClientError::TorrentNotFound(hash.to_string())),
        }
    }

    async fn record_action(&self, action: &str, hash: &str) {
        self.actions
            .write()
            .await
            .push((action.to_string(), hash.to_string()));
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.added.write().await.push(RecordedAddTorrent {
            request: request.clone(),
            timestamp: Utc::now(),
        });

        let hash = match info_hash_from_magnet(&request.magnet) {
            Some(hash) => hash,
            None => self.generate_hash().await,
        };
        let name = format!("Mock Torrent {}", hash.chars().take(8).collect::<String>());

        let status = TorrentStatus {
            hash: hash.clone(),
            name: name.clone(),
            state: if request.paused {
                TorrentState::Paused
            } else {
                TorrentState::Downloading
            },
            state_label: if request.paused { "pausedDL" } else { "downloading" }.to_string(),
            progress: 0.0,
            size_bytes: 100 * 1024 * 1024,
            download_speed: 1024 * 1024,
            upload_speed: 0,
            seeds: 10,
            leeches: 5,
            added_at: Some(Utc::now()),
            save_path: request.download_path.clone(),
            category: request.category.clone(),
        };
        self.torrents.write().await.insert(hash.clone(), status);

        Ok(AddTorrentResult {
            hash,
            name: Some(name),
        })
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentStatus>, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.torrents.read().await.values().cloned().collect())
    }

    async fn get_torrent(&self, hash: &str) -> Result<Option<TorrentStatus>, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.torrents.read().await.get(hash).cloned())
    }

    async fn torrent_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let mut files = self.files.write().await;
        match files.get_mut(hash) {
            Some(entry) if entry.hidden_polls > 0 => {
                entry.hidden_polls -= 1;
                Ok(Vec::new())
            }
            Some(entry) => Ok(entry.files.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn set_file_priority(
        &self,
        hash: &str,
        file_ids: &[u32],
        priority: FilePriority,
    ) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if let Some(entry) = self.files.write().await.get_mut(hash) {
            for file in entry.files.iter_mut() {
                if file_ids.contains(&file.index) {
                    file.priority = priority;
                }
            }
        }
        self.priorities.write().await.push(RecordedPriority {
            hash: hash.to_string(),
            file_ids: file_ids.to_vec(),
            priority,
        });
        Ok(())
    }

    async fn pause_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.update(hash, |t| {
            t.state = TorrentState::Paused;
            t.state_label = "pausedDL".to_string();
            t.download_speed = 0;
        })
        .await?;
        self.record_action("pause", hash).await;
        Ok(())
    }

    async fn resume_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.update(hash, |t| {
            t.state = TorrentState::Downloading;
            t.state_label = "downloading".to_string();
        })
        .await?;
        self.record_action("resume", hash).await;
        Ok(())
    }

    async fn remove_torrent(&self, hash: &str, delete_files: bool) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if let Some(message) = self.remove_error.read().await.clone() {
            return Err(TorrentClientError::ApiError(message));
        }
        if self.torrents.write().await.remove(hash).is_none() {
            return Err(TorrentClientError::TorrentNotFound(hash.to_string()));
        }
        self.removals.write().await.push(RecordedRemoval {
            hash: hash.to_string(),
            delete_files,
        });
        Ok(())
    }

    async fn recheck_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.update(hash, |t| {
            t.state = TorrentState::Checking;
            t.state_label = "checkingDL".to_string();
        })
        .await?;
        self.record_action("recheck", hash).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_add_uses_magnet_hash() {
        let client = MockTorrentClient::new();
        let result = client
            .add_torrent(AddTorrentRequest::magnet(fixtures::magnet(7, "Show")).with_tag("leetx"))
            .await
            .unwrap();

        assert_eq!(result.hash, fixtures::hash(7));
        assert!(client.has_torrent(&fixtures::hash(7)).await);
        let added = client.added_torrents().await;
        assert_eq!(added[0].request.tags, vec!["leetx".to_string()]);
    }

    #[tokio::test]
    async fn test_add_without_hash_generates_one() {
        let client = MockTorrentClient::new();
        let result = client
            .add_torrent(AddTorrentRequest::magnet("magnet:?dn=nothing"))
            .await
            .unwrap();
        assert_eq!(result.hash.len(), 40);
    }

    #[test]
    fn test_added_torrent_named_after_hash_prefix() {
        let client = MockTorrentClient::new();
        let status = tokio_test::block_on(async {
            let result = client
                .add_torrent(AddTorrentRequest::magnet(fixtures::magnet(7, "Show")))
                .await
                .unwrap();
            client.get_torrent(&result.hash).await.unwrap().unwrap()
        });
        let prefix: String = fixtures::hash(7).chars().take(8).collect();
        assert_eq!(status.name, format!("Mock Torrent {}", prefix));
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let client = MockTorrentClient::new();
        client
            .set_next_error(TorrentClientError::ConnectionFailed("down".into()))
            .await;

        assert!(client.list_torrents().await.is_err());
        assert!(client.list_torrents().await.is_ok());
    }

    #[tokio::test]
    async fn test_hidden_files_appear_after_polls() {
        let client = MockTorrentClient::new();
        let hash = fixtures::hash(1);
        client
            .set_files(&hash, vec![fixtures::file(0, "Show.mkv")], 2)
            .await;

        assert!(client.torrent_files(&hash).await.unwrap().is_empty());
        assert!(client.torrent_files(&hash).await.unwrap().is_empty());
        assert_eq!(client.torrent_files(&hash).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_records_delete_flag() {
        let client = MockTorrentClient::new();
        let hash = fixtures::hash(2);
        client
            .add_mock_torrent(fixtures::status(&hash, "Show", "downloading", 1000, 5, 0.5))
            .await;

        client.remove_torrent(&hash, false).await.unwrap();
        assert!(!client.has_torrent(&hash).await);
        assert_eq!(
            client.removals().await,
            vec![RecordedRemoval {
                hash: hash.clone(),
                delete_files: false
            }]
        );

        let missing = client.remove_torrent(&hash, false).await;
        assert!(matches!(missing, Err(TorrentClientError::TorrentNotFound(_))));
    }

    #[tokio::test]
    async fn test_pause_resume_recheck() {
        let client = MockTorrentClient::new();
        let hash = fixtures::hash(3);
        client
            .add_mock_torrent(fixtures::status(&hash, "Show", "downloading", 1000, 5, 0.5))
            .await;

        client.pause_torrent(&hash).await.unwrap();
        let status = client.get_torrent(&hash).await.unwrap().unwrap();
        assert_eq!(status.state, TorrentState::Paused);

        client.resume_torrent(&hash).await.unwrap();
        client.recheck_torrent(&hash).await.unwrap();
        let actions: Vec<_> = client.actions().await.into_iter().map(|(a, _)| a).collect();
        assert_eq!(actions, vec!["pause", "resume", "recheck"]);
    }
}
