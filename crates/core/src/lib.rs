pub mod aggregator;
pub mod config;
pub mod media_library;
pub mod metrics;
pub mod monitor;
pub mod source;
pub mod store;
pub mod submission;
pub mod testing;
pub mod torrent_client;

pub use aggregator::{Aggregator, SearchOutcome, SearchRequest};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use media_library::{JellyfinNotifier, LibraryError, LibraryNotifier};
pub use monitor::{
    CondemnReason, DownloadMonitor, MonitorController, MonitorError, MonitorStatus,
    ReplacementOutcome, TickReport,
};
pub use source::{build_sources, ResultRecord, SourceAdapter, SourceDetails, SourceError};
pub use store::{Blacklist, History, HistoryEntry, StoreError, Stores};
pub use submission::{
    MetadataWait, PriorityOutcome, SubmissionError, SubmissionPolicy, SubmissionReceipt,
};
pub use torrent_client::{
    AddTorrentRequest, QBittorrentClient, TorrentClient, TorrentClientError, TorrentStatus,
};
