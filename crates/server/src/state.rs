use std::sync::Arc;

use seedkeeper_core::{
    Aggregator, Config, DownloadMonitor, LibraryNotifier, MetadataWait, MonitorController,
    SanitizedConfig, SourceAdapter, Stores, SubmissionPolicy, TorrentClient,
};

/// Shared application state
pub struct AppState {
    config: Config,
    client: Arc<dyn TorrentClient>,
    aggregator: Arc<Aggregator>,
    submission: SubmissionPolicy,
    stores: Stores,
    monitor: Arc<MonitorController>,
}

impl AppState {
    /// Wire the aggregator, submission policy and monitor around the given
    /// adapters. The monitor loop is created stopped.
    pub fn new(
        config: Config,
        client: Arc<dyn TorrentClient>,
        sources: Vec<Arc<dyn SourceAdapter>>,
        stores: Stores,
        notifier: Option<Arc<dyn LibraryNotifier>>,
    ) -> Self {
        let aggregator = Arc::new(Aggregator::new(
            sources,
            Arc::clone(&stores.blacklist),
            config.filters.clone(),
            config.sources.max_results,
        ));

        let submission = SubmissionPolicy::new(
            Arc::clone(&client),
            Arc::clone(&stores.history),
            config.filters.clone(),
            MetadataWait::from(&config.monitor),
        )
        .with_destination(&config.torrent_client);

        let mut monitor = DownloadMonitor::new(
            Arc::clone(&client),
            Arc::clone(&aggregator),
            submission.clone(),
            Arc::clone(&stores.blacklist),
            &config.monitor,
        );
        if let Some(notifier) = notifier {
            monitor = monitor.with_notifier(notifier);
        }
        let monitor = Arc::new(MonitorController::new(Arc::new(monitor), &config.monitor));

        Self {
            config,
            client,
            aggregator,
            submission,
            stores,
            monitor,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn torrent_client(&self) -> &Arc<dyn TorrentClient> {
        &self.client
    }

    pub fn aggregator(&self) -> &Aggregator {
        self.aggregator.as_ref()
    }

    pub fn submission(&self) -> &SubmissionPolicy {
        &self.submission
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn monitor(&self) -> &Arc<MonitorController> {
        &self.monitor
    }
}
