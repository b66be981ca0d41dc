//! Download monitor.
//!
//! Periodically inspects every download on the client, condemns unhealthy
//! ones (blacklist + remove) and submits the best remaining alternative.
//! Completed downloads are announced to the media library once.

mod condemn;
mod runner;
mod types;
mod watchdog;

pub use condemn::{evaluate, is_monitored, reports_error, CondemnReason, HealthThresholds};
pub use runner::MonitorController;
pub use types::{
    CondemnedTorrent, MonitorError, MonitorStats, MonitorStatus, ReplacementOutcome, TickReport,
};
pub use watchdog::DownloadMonitor;
