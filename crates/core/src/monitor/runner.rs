//! Background loop driving the download monitor.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::MonitorConfig;

use super::types::{MonitorError, MonitorStatus, TickReport};
use super::watchdog::DownloadMonitor;

/// Owns the monitor loop's running flag and shutdown signal.
///
/// `start` and `stop` are idempotent. A stopped loop exits at its next
/// wake-up; a pass already in flight runs to completion.
pub struct MonitorController {
    monitor: Arc<DownloadMonitor>,
    interval: Duration,

    // Runtime state
    running: Arc<AtomicBool>,
    /// Bumped on every start so a loop from an earlier run never continues.
    generation: Arc<AtomicU64>,
    shutdown_tx: broadcast::Sender<()>,
}

impl MonitorController {
    pub fn new(monitor: Arc<DownloadMonitor>, config: &MonitorConfig) -> Self {
        Self::with_interval(monitor, Duration::from_secs(config.interval_secs))
    }

    pub fn with_interval(monitor: Arc<DownloadMonitor>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            monitor,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
        }
    }

    /// Start the loop. The first pass runs immediately.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Monitor already running");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.spawn_loop(generation);
        info!(interval_secs = self.interval.as_secs(), "Monitor started");
    }

    /// Stop the loop.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Monitor not running");
            return;
        }

        // Signal shutdown to the loop
        let _ = self.shutdown_tx.send(());
        info!("Monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            running: self.is_running(),
            interval_secs: self.interval.as_secs(),
            stats: self.monitor.stats(),
        }
    }

    /// Run one pass now, independent of the loop.
    pub async fn tick(&self) -> Result<TickReport, MonitorError> {
        self.monitor.tick().await
    }

    fn spawn_loop(&self, generation: u64) {
        let running = Arc::clone(&self.running);
        let current = Arc::clone(&self.generation);
        let monitor = Arc::clone(&self.monitor);
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Monitor loop started");
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                    _ = ticker.tick() => {
                        if !running.load(Ordering::Relaxed)
                            || current.load(Ordering::SeqCst) != generation
                        {
                            break;
                        }

                        if let Err(e) = monitor.tick().await {
                            warn!(error = %e, "Monitor pass failed");
                        }
                    }
                }
            }
            info!("Monitor loop stopped");
        });
    }
}
