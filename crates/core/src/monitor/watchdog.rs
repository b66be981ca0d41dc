//! One monitor pass: condemn unhealthy downloads and replace them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, SearchRequest};
use crate::config::MonitorConfig;
use crate::media_library::LibraryNotifier;
use crate::metrics;
use crate::store::Blacklist;
use crate::submission::SubmissionPolicy;
use crate::torrent_client::{TorrentClient, TorrentStatus};

use super::condemn::{evaluate, is_monitored, reports_error, HealthThresholds};
use super::types::{CondemnedTorrent, MonitorError, MonitorStats, ReplacementOutcome, TickReport};

/// Evaluates every download on the client once per pass.
///
/// Passes are serialized: a manual pass waits for a running one.
pub struct DownloadMonitor {
    client: Arc<dyn TorrentClient>,
    aggregator: Arc<Aggregator>,
    submission: SubmissionPolicy,
    blacklist: Arc<Blacklist>,
    notifier: Option<Arc<dyn LibraryNotifier>>,
    thresholds: HealthThresholds,
    stats: Mutex<MonitorStats>,
    /// Completed hashes already announced to the media library.
    notified: Mutex<HashSet<String>>,
    pass_lock: tokio::sync::Mutex<()>,
}

impl DownloadMonitor {
    pub fn new(
        client: Arc<dyn TorrentClient>,
        aggregator: Arc<Aggregator>,
        submission: SubmissionPolicy,
        blacklist: Arc<Blacklist>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            client,
            aggregator,
            submission,
            blacklist,
            notifier: None,
            thresholds: HealthThresholds::from(config),
            stats: Mutex::new(MonitorStats::default()),
            notified: Mutex::new(HashSet::new()),
            pass_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Announce completed downloads to a media library.
    pub fn with_notifier(mut self, notifier: Arc<dyn LibraryNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one pass.
    ///
    /// Only a failure to list torrents aborts the pass; problems with a
    /// single torrent end up in its [`ReplacementOutcome`].
    pub async fn tick(&self) -> Result<TickReport, MonitorError> {
        let _pass = self.pass_lock.lock().await;
        let started_at = Utc::now();
        metrics::MONITOR_TICKS.inc();

        let torrents = match self.client.list_torrents().await {
            Ok(torrents) => torrents,
            Err(e) => {
                let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
                stats.ticks += 1;
                stats.last_tick_at = Some(started_at);
                stats.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let notified = self.notify_completed(&torrents);

        let mut checked = 0;
        let mut condemned = Vec::new();
        for status in torrents.iter().filter(|t| is_monitored(t)) {
            checked += 1;
            let Some(reason) = evaluate(status, &self.thresholds) else {
                continue;
            };

            metrics::CONDEMNATIONS
                .with_label_values(&[reason.as_str()])
                .inc();
            warn!(
                hash = %status.hash,
                name = %status.name,
                reason = %reason,
                state = %status.state_label,
                seeds = status.seeds,
                speed = status.download_speed,
                "Condemning torrent"
            );

            let outcome = self.condemn(status).await;
            metrics::REPLACEMENTS
                .with_label_values(&[outcome.label()])
                .inc();
            condemned.push(CondemnedTorrent {
                hash: status.hash.clone(),
                name: status.name.clone(),
                reason,
                outcome,
            });
        }

        let report = TickReport {
            started_at,
            finished_at: Utc::now(),
            checked,
            condemned,
            notified,
        };
        self.record(&report);

        debug!(
            torrents = torrents.len(),
            checked = report.checked,
            condemned = report.condemned.len(),
            "Monitor pass complete"
        );
        Ok(report)
    }

    /// Blacklist, remove and try to replace one torrent.
    async fn condemn(&self, status: &TorrentStatus) -> ReplacementOutcome {
        if let Err(e) = self.blacklist.add(&status.hash) {
            warn!(
                hash = %status.hash,
                error = %e,
                "Blacklist not persisted, leaving torrent for the next pass"
            );
            return ReplacementOutcome::Failed {
                error: e.to_string(),
            };
        }
        info!(hash = %status.hash, name = %status.name, "Added to blacklist");

        if let Err(e) = self.client.remove_torrent(&status.hash, false).await {
            warn!(hash = %status.hash, error = %e, "Failed to remove condemned torrent");
            return ReplacementOutcome::Failed {
                error: e.to_string(),
            };
        }

        self.replace(&status.name).await
    }

    /// Search for the condemned name and submit the best candidate.
    async fn replace(&self, name: &str) -> ReplacementOutcome {
        let request = SearchRequest::new(name).with_size_range(Some(0.0), Some(f64::MAX));
        let outcome = self.aggregator.search(&request).await;

        let Some((best, magnet)) = outcome
            .results
            .into_iter()
            .find_map(|r| r.magnet.clone().map(|magnet| (r, magnet)))
        else {
            warn!(name = %name, "No alternatives found");
            return ReplacementOutcome::Abandoned;
        };

        info!(
            name = %name,
            alternative = %best.name,
            source = %best.source,
            seeds = best.seeds,
            "Found alternative"
        );

        match self
            .submission
            .submit(&magnet, &best.source, Some(&best.name))
            .await
        {
            Ok(receipt) => ReplacementOutcome::Replaced {
                hash: receipt.hash,
                name: receipt.name,
                source: receipt.source,
            },
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to submit alternative");
                ReplacementOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Fire one library rescan per newly completed torrent.
    fn notify_completed(&self, torrents: &[TorrentStatus]) -> Vec<String> {
        let Some(notifier) = &self.notifier else {
            return Vec::new();
        };

        let mut seen = self.notified.lock().unwrap_or_else(PoisonError::into_inner);
        seen.retain(|hash| torrents.iter().any(|t| &t.hash == hash));

        let mut fired = Vec::new();
        for status in torrents.iter().filter(|t| t.is_complete() && !reports_error(t)) {
            if !seen.insert(status.hash.clone()) {
                continue;
            }

            let notifier = Arc::clone(notifier);
            let hash = status.hash.clone();
            let path = status.save_path.clone();
            tokio::spawn(async move {
                match notifier.media_added(path.as_deref()).await {
                    Ok(()) => {
                        metrics::LIBRARY_NOTIFICATIONS
                            .with_label_values(&["success"])
                            .inc();
                        debug!(hash = %hash, library = notifier.name(), "Library rescan requested");
                    }
                    Err(e) => {
                        metrics::LIBRARY_NOTIFICATIONS
                            .with_label_values(&["failed"])
                            .inc();
                        warn!(hash = %hash, library = notifier.name(), error = %e, "Library rescan failed");
                    }
                }
            });
            fired.push(status.hash.clone());
        }
        fired
    }

    fn record(&self, report: &TickReport) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.ticks += 1;
        stats.last_tick_at = Some(report.started_at);
        stats.last_error = None;
        for condemned in &report.condemned {
            stats.condemned += 1;
            match condemned.outcome {
                ReplacementOutcome::Replaced { .. } => stats.replaced += 1,
                ReplacementOutcome::Abandoned => stats.abandoned += 1,
                ReplacementOutcome::Failed { .. } => stats.failed += 1,
            }
        }
    }
}
