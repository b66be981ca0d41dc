use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    pub torrent_client: QBittorrentConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub media_library: Option<MediaLibraryConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5000
}

/// Which backend persists the blacklist and history documents.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

/// Persistent store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_blacklist_path")]
    pub blacklist_path: PathBuf,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    /// Only used when `backend = "sqlite"`.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            blacklist_path: default_blacklist_path(),
            history_path: default_history_path(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

fn default_blacklist_path() -> PathBuf {
    PathBuf::from("blacklist.json")
}

fn default_history_path() -> PathBuf {
    PathBuf::from("history.json")
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("seedkeeper.db")
}

/// Source adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Maximum rows taken from each source's result page.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_leetx")]
    pub leetx: SiteConfig,
    #[serde(default = "default_watchsomuch")]
    pub watchsomuch: SiteConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            leetx: default_leetx(),
            watchsomuch: default_watchsomuch(),
        }
    }
}

/// A single scraped site.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub base_url: String,
}

fn default_leetx() -> SiteConfig {
    SiteConfig {
        enabled: true,
        base_url: "https://1337x.to".to_string(),
    }
}

fn default_watchsomuch() -> SiteConfig {
    SiteConfig {
        enabled: true,
        base_url: "https://watchsomuch.to".to_string(),
    }
}

fn default_max_results() -> usize {
    50
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_true() -> bool {
    true
}

/// Result filtering rules shared by the aggregator and the file-priority policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Quality tier -> name aliases (matched case-insensitively as substrings).
    #[serde(default = "default_quality_keywords")]
    pub quality_keywords: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
    #[serde(default = "default_min_size_gb")]
    pub default_min_size_gb: f64,
    #[serde(default = "default_max_size_gb")]
    pub default_max_size_gb: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            quality_keywords: default_quality_keywords(),
            media_extensions: default_media_extensions(),
            excluded_extensions: default_excluded_extensions(),
            default_min_size_gb: default_min_size_gb(),
            default_max_size_gb: default_max_size_gb(),
        }
    }
}

fn default_quality_keywords() -> BTreeMap<String, Vec<String>> {
    let tiers: [(&str, &[&str]); 4] = [
        ("480p", &["480p", "SD"]),
        ("720p", &["720p", "HD", "HDTV"]),
        ("1080p", &["1080p", "FHD", "Full HD", "FullHD"]),
        ("2160p", &["2160p", "4K", "UHD"]),
    ];
    tiers
        .into_iter()
        .map(|(tier, aliases)| {
            (
                tier.to_string(),
                aliases.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect()
}

fn default_media_extensions() -> Vec<String> {
    [".mkv", ".mp4", ".avi", ".mov", ".wmv", ".flv"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_excluded_extensions() -> Vec<String> {
    [".txt", ".nfo", ".jpg", ".png", ".srt", ".sub"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_min_size_gb() -> f64 {
    0.1
}

fn default_max_size_gb() -> f64 {
    50.0
}

/// qBittorrent connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Save path override for new torrents.
    #[serde(default)]
    pub download_path: Option<String>,
    /// Category applied to new torrents.
    #[serde(default)]
    pub category: Option<String>,
}

/// Download monitor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Start the monitor loop at boot. Otherwise it is started via the API.
    #[serde(default)]
    pub auto_start: bool,
    /// Seconds between monitoring passes.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Torrents with fewer connected seeds are condemned.
    #[serde(default = "default_min_seeds")]
    pub min_seeds: u32,
    /// Torrents downloading slower than this (but faster than zero) are condemned.
    #[serde(default = "default_min_speed_kb")]
    pub min_download_speed_kb: u64,
    /// Wait after submission before reading the file list.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// How many times the file list is polled before giving up.
    #[serde(default = "default_metadata_attempts")]
    pub metadata_attempts: u32,
    #[serde(default = "default_metadata_retry")]
    pub metadata_retry_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            interval_secs: default_interval(),
            min_seeds: default_min_seeds(),
            min_download_speed_kb: default_min_speed_kb(),
            settle_delay_ms: default_settle_delay(),
            metadata_attempts: default_metadata_attempts(),
            metadata_retry_ms: default_metadata_retry(),
        }
    }
}

impl MonitorConfig {
    /// Minimum throughput in bytes/second.
    pub fn min_download_speed_bps(&self) -> u64 {
        self.min_download_speed_kb * 1024
    }
}

fn default_interval() -> u64 {
    60
}

fn default_min_seeds() -> u32 {
    1
}

fn default_min_speed_kb() -> u64 {
    10
}

fn default_settle_delay() -> u64 {
    2000
}

fn default_metadata_attempts() -> u32 {
    5
}

fn default_metadata_retry() -> u64 {
    1000
}

/// Jellyfin library rescan configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaLibraryConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_true")]
    pub auto_scan: bool,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub sources: SourcesConfig,
    pub filters: FilterConfig,
    pub torrent_client: SanitizedQBittorrentConfig,
    pub monitor: MonitorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_library: Option<SanitizedMediaLibraryConfig>,
}

/// qBittorrent config with the password hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMediaLibraryConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub auto_scan: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            sources: config.sources.clone(),
            filters: config.filters.clone(),
            torrent_client: SanitizedQBittorrentConfig {
                url: config.torrent_client.url.clone(),
                username: config.torrent_client.username.clone(),
                password_configured: !config.torrent_client.password.is_empty(),
                timeout_secs: config.torrent_client.timeout_secs,
                download_path: config.torrent_client.download_path.clone(),
            },
            monitor: config.monitor.clone(),
            media_library: config
                .media_library
                .as_ref()
                .map(|m| SanitizedMediaLibraryConfig {
                    url: m.url.clone(),
                    api_key_configured: !m.api_key.is_empty(),
                    auto_scan: m.auto_scan,
                }),
        }
    }
}
