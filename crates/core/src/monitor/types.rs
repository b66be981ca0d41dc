//! Types for the download monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::condemn::CondemnReason;

/// Errors that abort a whole monitor pass.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The torrent list could not be read.
    #[error("torrent client error: {0}")]
    TorrentClient(#[from] crate::torrent_client::TorrentClientError),
}

/// What happened after a torrent was condemned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplacementOutcome {
    /// An alternative was submitted.
    Replaced {
        hash: String,
        name: String,
        source: String,
    },
    /// No alternative was found.
    Abandoned,
    /// Removal or resubmission failed.
    Failed { error: String },
}

impl ReplacementOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            ReplacementOutcome::Replaced { .. } => "replaced",
            ReplacementOutcome::Abandoned => "abandoned",
            ReplacementOutcome::Failed { .. } => "failed",
        }
    }
}

/// A torrent condemned during a pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondemnedTorrent {
    pub hash: String,
    pub name: String,
    pub reason: CondemnReason,
    #[serde(flatten)]
    pub outcome: ReplacementOutcome,
}

/// Summary of one monitor pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Torrents evaluated (incomplete and actively transferring).
    pub checked: usize,
    pub condemned: Vec<CondemnedTorrent>,
    /// Hashes whose completion triggered a library rescan.
    pub notified: Vec<String>,
}

/// Running totals across passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorStats {
    pub ticks: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    /// Error of the most recent pass, cleared by a successful one.
    pub last_error: Option<String>,
    pub condemned: u64,
    pub replaced: u64,
    pub abandoned: u64,
    pub failed: u64,
}

/// Current status of the monitor loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Whether the loop is running.
    pub running: bool,
    pub interval_secs: u64,
    #[serde(flatten)]
    pub stats: MonitorStats,
}
