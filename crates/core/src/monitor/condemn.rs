//! Health heuristic for in-flight downloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::torrent_client::{TorrentState, TorrentStatus};

/// Why a torrent was condemned. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CondemnReason {
    /// The engine reports an error or missing files.
    ErrorState,
    /// Stalled with no throughput.
    Stalled,
    LowSeeds,
    /// Moving, but below the minimum throughput.
    LowSpeed,
}

impl CondemnReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CondemnReason::ErrorState => "error_state",
            CondemnReason::Stalled => "stalled",
            CondemnReason::LowSeeds => "low_seeds",
            CondemnReason::LowSpeed => "low_speed",
        }
    }
}

impl fmt::Display for CondemnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimums a download must meet to survive a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    pub min_seeds: u32,
    /// Bytes per second.
    pub min_download_speed: u64,
}

impl From<&MonitorConfig> for HealthThresholds {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            min_seeds: config.min_seeds,
            min_download_speed: config.min_download_speed_bps(),
        }
    }
}

/// Whether the engine reports an error or missing files, at any progress.
pub fn reports_error(status: &TorrentStatus) -> bool {
    let label = status.state_label.to_lowercase();
    label.contains("error") || label.contains("missing")
}

/// Whether the monitor should judge this torrent at all.
///
/// Errored torrents are always judged. Otherwise finished torrents and ones
/// the user or engine has parked (paused, checking, queued) are left alone.
pub fn is_monitored(status: &TorrentStatus) -> bool {
    if reports_error(status) {
        return true;
    }
    !status.is_complete()
        && !matches!(
            status.state,
            TorrentState::Paused | TorrentState::Checking | TorrentState::Queued
        )
}

/// Apply the heuristic. The low-speed rule looks at the current sample only.
pub fn evaluate(status: &TorrentStatus, thresholds: &HealthThresholds) -> Option<CondemnReason> {
    if reports_error(status) {
        return Some(CondemnReason::ErrorState);
    }
    if status.state_label.to_lowercase().contains("stalled") && status.download_speed == 0 {
        return Some(CondemnReason::Stalled);
    }
    if status.seeds < thresholds.min_seeds {
        return Some(CondemnReason::LowSeeds);
    }
    if status.download_speed > 0 && status.download_speed < thresholds.min_download_speed {
        return Some(CondemnReason::LowSpeed);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    const THRESHOLDS: HealthThresholds = HealthThresholds {
        min_seeds: 2,
        min_download_speed: 10 * 1024,
    };

    fn judge(label: &str, speed: u64, seeds: u32) -> Option<CondemnReason> {
        let status = fixtures::status(&fixtures::hash(1), "Show", label, speed, seeds, 0.3);
        evaluate(&status, &THRESHOLDS)
    }

    #[test]
    fn test_error_labels_condemned() {
        assert_eq!(judge("error", 50_000, 10), Some(CondemnReason::ErrorState));
        assert_eq!(judge("missingFiles", 50_000, 10), Some(CondemnReason::ErrorState));
        assert_eq!(judge("ERROR", 50_000, 10), Some(CondemnReason::ErrorState));
    }

    #[test]
    fn test_healthy_download_survives() {
        assert_eq!(judge("downloading", 50_000, 2), None);
        assert_eq!(judge("downloading", 10 * 1024, 5), None);
    }

    #[test]
    fn test_stalled_without_speed_condemned_regardless_of_seeds() {
        assert_eq!(judge("stalledDL", 0, 100), Some(CondemnReason::Stalled));
    }

    #[test]
    fn test_stalled_label_with_speed_is_judged_on_other_rules() {
        assert_eq!(judge("stalledDL", 50_000, 5), None);
    }

    #[test]
    fn test_low_seeds_condemned() {
        assert_eq!(judge("downloading", 50_000, 1), Some(CondemnReason::LowSeeds));
    }

    #[test]
    fn test_low_speed_condemned_but_zero_speed_is_not() {
        assert_eq!(judge("downloading", 512, 5), Some(CondemnReason::LowSpeed));
        assert_eq!(judge("downloading", 0, 5), None);
    }

    #[test]
    fn test_thresholds_from_config() {
        let config = MonitorConfig {
            min_seeds: 3,
            min_download_speed_kb: 20,
            ..Default::default()
        };
        let thresholds = HealthThresholds::from(&config);
        assert_eq!(thresholds.min_seeds, 3);
        assert_eq!(thresholds.min_download_speed, 20 * 1024);
    }

    #[test]
    fn test_parked_and_finished_torrents_not_monitored() {
        let hash = fixtures::hash(1);
        assert!(is_monitored(&fixtures::status(&hash, "a", "stalledDL", 0, 0, 0.5)));
        assert!(!is_monitored(&fixtures::status(&hash, "a", "pausedDL", 0, 0, 0.5)));
        assert!(!is_monitored(&fixtures::status(&hash, "a", "queuedDL", 0, 0, 0.5)));
        assert!(!is_monitored(&fixtures::status(&hash, "a", "checkingDL", 0, 0, 0.5)));
        assert!(!is_monitored(&fixtures::status(&hash, "a", "stalledUP", 0, 0, 1.0)));
    }

    #[test]
    fn test_finished_torrent_with_missing_files_condemned() {
        let status = fixtures::status(&fixtures::hash(1), "Show", "missingFiles", 0, 0, 1.0);
        assert!(is_monitored(&status));
        assert_eq!(evaluate(&status, &THRESHOLDS), Some(CondemnReason::ErrorState));

        let errored = fixtures::status(&fixtures::hash(2), "Show", "error", 0, 0, 1.0);
        assert!(is_monitored(&errored));
    }
}
