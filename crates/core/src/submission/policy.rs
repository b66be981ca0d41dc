use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aggregator::has_extension;
use crate::config::{FilterConfig, MonitorConfig, QBittorrentConfig};
use crate::metrics;
use crate::store::{History, HistoryEntry};
use crate::torrent_client::{AddTorrentRequest, FilePriority, TorrentClient, TorrentFile};

use super::{PriorityOutcome, SubmissionError, SubmissionReceipt};

/// How long to wait for a new torrent's file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataWait {
    /// Wait before the first read.
    pub settle_delay: Duration,
    pub attempts: u32,
    /// Wait between reads that came back empty.
    pub retry_delay: Duration,
}

impl From<&MonitorConfig> for MetadataWait {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            attempts: config.metadata_attempts.max(1),
            retry_delay: Duration::from_millis(config.metadata_retry_ms),
        }
    }
}

/// Submits magnets, records them in history and trims non-media files.
#[derive(Clone)]
pub struct SubmissionPolicy {
    client: Arc<dyn TorrentClient>,
    history: Arc<History>,
    filters: Arc<FilterConfig>,
    wait: MetadataWait,
    download_path: Option<String>,
    category: Option<String>,
}

impl SubmissionPolicy {
    pub fn new(
        client: Arc<dyn TorrentClient>,
        history: Arc<History>,
        filters: FilterConfig,
        wait: MetadataWait,
    ) -> Self {
        Self {
            client,
            history,
            filters: Arc::new(filters),
            wait,
            download_path: None,
            category: None,
        }
    }

    /// Use the client config's save path and category for new torrents.
    pub fn with_destination(mut self, config: &QBittorrentConfig) -> Self {
        self.download_path = config.download_path.clone();
        self.category = config.category.clone();
        self
    }

    /// Submit a magnet.
    ///
    /// On success one history entry is appended and the file-priority step
    /// runs in the background.
    pub async fn submit(
        &self,
        magnet: &str,
        source: &str,
        name: Option<&str>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submit_tracked(magnet, source, name)
            .await
            .map(|(receipt, _)| receipt)
    }

    /// Like [`submit`](Self::submit), also returning the handle of the
    /// background file-priority task.
    pub async fn submit_tracked(
        &self,
        magnet: &str,
        source: &str,
        name: Option<&str>,
    ) -> Result<(SubmissionReceipt, JoinHandle<PriorityOutcome>), SubmissionError> {
        let magnet = magnet.trim();
        if !magnet.to_ascii_lowercase().starts_with("magnet:?") {
            metrics::SUBMISSIONS_TOTAL.with_label_values(&["failed"]).inc();
            return Err(SubmissionError::InvalidMagnet(
                "expected a magnet:? URI".to_string(),
            ));
        }
        let source = match source.trim() {
            "" => "unknown",
            s => s,
        };

        let mut request = AddTorrentRequest::magnet(magnet).with_tag(source);
        if let Some(path) = &self.download_path {
            request = request.with_download_path(path.clone());
        }
        if let Some(category) = &self.category {
            request = request.with_category(category.clone());
        }

        let added = match self.client.add_torrent(request).await {
            Ok(added) => added,
            Err(e) => {
                warn!(source = %source, error = %e, "Download client rejected submission");
                metrics::SUBMISSIONS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e.into());
            }
        };

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or(added.name)
            .unwrap_or_else(|| added.hash.clone());

        let history_saved = self
            .history
            .append(HistoryEntry::now(&added.hash, &name, source, magnet))
            .is_ok();

        metrics::SUBMISSIONS_TOTAL.with_label_values(&["success"]).inc();
        info!(hash = %added.hash, name = %name, source = %source, "Torrent submitted");

        let policy = self.clone();
        let hash = added.hash.clone();
        let handle = tokio::spawn(async move { policy.apply_file_priorities(&hash).await });

        Ok((
            SubmissionReceipt {
                hash: added.hash,
                name,
                source: source.to_string(),
                history_saved,
            },
            handle,
        ))
    }

    /// Mark every excluded, non-media file of a torrent as skipped.
    ///
    /// Best-effort: waits the settle delay, polls for the file list and gives
    /// up quietly when it never shows up.
    pub async fn apply_file_priorities(&self, hash: &str) -> PriorityOutcome {
        tokio::time::sleep(self.wait.settle_delay).await;

        let Some(files) = self.wait_for_files(hash).await else {
            debug!(hash = %hash, "No file metadata, leaving priorities alone");
            return PriorityOutcome::NoMetadata;
        };

        let skip: Vec<u32> = files
            .iter()
            .filter(|f| self.should_skip(&f.name))
            .map(|f| f.index)
            .collect();
        if skip.is_empty() {
            return PriorityOutcome::Applied { skipped: 0 };
        }

        match self
            .client
            .set_file_priority(hash, &skip, FilePriority::Skip)
            .await
        {
            Ok(()) => {
                metrics::FILES_SKIPPED.inc_by(skip.len() as u64);
                info!(hash = %hash, skipped = skip.len(), "Skipping non-media files");
                PriorityOutcome::Applied {
                    skipped: skip.len(),
                }
            }
            Err(e) => {
                warn!(hash = %hash, error = %e, "Failed to set file priorities");
                PriorityOutcome::Failed
            }
        }
    }

    /// Excluded extension and no media extension.
    pub fn should_skip(&self, file_name: &str) -> bool {
        has_extension(file_name, &self.filters.excluded_extensions)
            && !has_extension(file_name, &self.filters.media_extensions)
    }

    async fn wait_for_files(&self, hash: &str) -> Option<Vec<TorrentFile>> {
        for attempt in 1..=self.wait.attempts {
            match self.client.torrent_files(hash).await {
                Ok(files) if !files.is_empty() => return Some(files),
                Ok(_) => debug!(hash = %hash, attempt, "File metadata not ready"),
                Err(e) => debug!(hash = %hash, attempt, error = %e, "Failed to read torrent files"),
            }
            if attempt < self.wait.attempts {
                tokio::time::sleep(self.wait.retry_delay).await;
            }
        }
        None
    }
}
