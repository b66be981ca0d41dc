//! qBittorrent Web API v2 client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::QBittorrentConfig;
use crate::source::info_hash_from_magnet;

use super::{
    AddTorrentRequest, AddTorrentResult, FilePriority, TorrentClient, TorrentClientError,
    TorrentFile, TorrentState, TorrentStatus,
};

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Whether the cookie jar currently holds a session (reset on 403).
    authenticated: RwLock<bool>,
}

fn map_request_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

impl QBittorrentClient {
    /// Build a client without contacting the server.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            authenticated: RwLock::new(false),
        })
    }

    /// Build a client and log in, failing if the server is unreachable or
    /// rejects the credentials.
    pub async fn connect(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Self::new(config)?;
        client.login().await?;

        let version = client
            .send("/api/v2/app/version", || client.client.get(client.url("/api/v2/app/version")))
            .await?;
        info!(url = client.base_url(), version = version.trim(), "Connected to qBittorrent");

        Ok(client)
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url(), endpoint)
    }

    /// Login; the session cookie lands in the client's cookie jar.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(self.url("/api/v2/auth/login"))
            .form(&params)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.authenticated.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        if *self.authenticated.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Send an authenticated request, logging in again once if the session expired.
    ///
    /// `build` is called again for the retry, so it must produce a fresh request.
    async fn send<F>(&self, endpoint: &str, build: F) -> Result<String, TorrentClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let mut response = build().send().await.map_err(map_request_error)?;
        if response.status() == StatusCode::FORBIDDEN {
            warn!(endpoint = endpoint, "qBittorrent session expired, re-authenticating");
            *self.authenticated.write().await = false;
            self.login().await?;
            response = build().send().await.map_err(map_request_error)?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TorrentClientError::TorrentNotFound(endpoint.to_string()));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {} from {}", status, endpoint)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }

    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        let url = self.url(endpoint);
        self.send(endpoint, || self.client.get(&url)).await
    }

    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        let url = self.url(endpoint);
        self.send(endpoint, || self.client.post(&url).form(params)).await
    }

    async fn fetch_info(&self, endpoint: &str) -> Result<Vec<TorrentStatus>, TorrentClientError> {
        let body = self.get(endpoint).await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&body)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;
        Ok(torrents.into_iter().map(QBTorrentInfo::into_status).collect())
    }

    /// The torrent added most recently, used when a magnet carries no hex hash.
    async fn most_recent_torrent(&self) -> Result<TorrentStatus, TorrentClientError> {
        self.fetch_info("/api/v2/torrents/info?sort=added_on&reverse=true&limit=1")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                TorrentClientError::ApiError("torrent accepted but not listed".to_string())
            })
    }
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    dlspeed: i64,
    #[serde(default)]
    upspeed: i64,
    #[serde(default)]
    num_seeds: i64,
    #[serde(default)]
    num_leechs: i64,
    #[serde(default)]
    added_on: i64,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    category: String,
}

impl QBTorrentInfo {
    fn into_status(self) -> TorrentStatus {
        TorrentStatus {
            hash: self.hash.to_lowercase(),
            name: self.name,
            state: parse_qb_state(&self.state),
            state_label: self.state,
            progress: self.progress,
            size_bytes: self.size.max(0) as u64,
            download_speed: self.dlspeed.max(0) as u64,
            upload_speed: self.upspeed.max(0) as u64,
            seeds: self.num_seeds.max(0) as u32,
            leeches: self.num_leechs.max(0) as u32,
            added_at: timestamp_to_datetime(self.added_on),
            save_path: Some(self.save_path).filter(|p| !p.is_empty()),
            category: Some(self.category).filter(|c| !c.is_empty()),
        }
    }
}

/// qBittorrent file entry; `index` is missing on older Web API versions.
#[derive(Debug, Deserialize)]
struct QBFile {
    #[serde(default)]
    index: Option<u32>,
    name: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    priority: i64,
}

impl QBFile {
    fn into_file(self, position: usize) -> TorrentFile {
        TorrentFile {
            index: self.index.unwrap_or(position as u32),
            name: self.name,
            size_bytes: self.size.max(0) as u64,
            progress: self.progress,
            priority: FilePriority::from_qb(self.priority),
        }
    }
}

/// Parse qBittorrent state string to TorrentState.
pub fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "forcedMetaDL" | "allocating" => {
            TorrentState::Downloading
        }
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Paused,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "stalledDL" | "stalledUP" => TorrentState::Stalled,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 0 {
        Utc.timestamp_opt(ts, 0).single()
    } else {
        None
    }
}

/// The `dn` (display name) parameter of a magnet, URL-decoded.
fn magnet_display_name(magnet: &str) -> Option<String> {
    let (_, query) = magnet.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("dn="))
        .map(|raw| raw.replace('+', " "))
        .and_then(|raw| urlencoding::decode(&raw).ok().map(|name| name.into_owned()))
        .filter(|name| !name.is_empty())
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let endpoint = "/api/v2/torrents/add";
        let url = self.url(endpoint);
        let save_path = request
            .download_path
            .clone()
            .or_else(|| self.config.download_path.clone());
        let category = request.category.clone().or_else(|| self.config.category.clone());

        let body = self
            .send(endpoint, || {
                let mut form = multipart::Form::new().text("urls", request.magnet.clone());
                if !request.tags.is_empty() {
                    form = form.text("tags", request.tags.join(","));
                }
                if let Some(path) = &save_path {
                    form = form.text("savepath", path.clone());
                }
                if let Some(cat) = &category {
                    form = form.text("category", cat.clone());
                }
                if request.paused {
                    form = form.text("paused", "true");
                }
                self.client.post(&url).multipart(form)
            })
            .await?;

        if body.trim() == "Fails." {
            return Err(TorrentClientError::Rejected(
                "qBittorrent refused the magnet".to_string(),
            ));
        }

        match info_hash_from_magnet(&request.magnet) {
            Some(hash) => Ok(AddTorrentResult {
                hash,
                name: magnet_display_name(&request.magnet),
            }),
            None => {
                debug!("Magnet has no hex info hash, using most recently added torrent");
                let latest = self.most_recent_torrent().await?;
                Ok(AddTorrentResult {
                    hash: latest.hash,
                    name: Some(latest.name),
                })
            }
        }
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentStatus>, TorrentClientError> {
        self.fetch_info("/api/v2/torrents/info").await
    }

    async fn get_torrent(&self, hash: &str) -> Result<Option<TorrentStatus>, TorrentClientError> {
        let endpoint = format!("/api/v2/torrents/info?hashes={}", hash.to_lowercase());
        Ok(self.fetch_info(&endpoint).await?.into_iter().next())
    }

    async fn torrent_files(&self, hash: &str) -> Result<Vec<TorrentFile>, TorrentClientError> {
        let endpoint = format!("/api/v2/torrents/files?hash={}", hash.to_lowercase());
        let body = self.get(&endpoint).await.map_err(|e| match e {
            TorrentClientError::TorrentNotFound(_) => {
                TorrentClientError::TorrentNotFound(hash.to_string())
            }
            other => other,
        })?;

        let files: Vec<QBFile> = serde_json::from_str(&body)
            .map_err(|e| TorrentClientError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(files
            .into_iter()
            .enumerate()
            .map(|(position, file)| file.into_file(position))
            .collect())
    }

    async fn set_file_priority(
        &self,
        hash: &str,
        file_ids: &[u32],
        priority: FilePriority,
    ) -> Result<(), TorrentClientError> {
        if file_ids.is_empty() {
            return Ok(());
        }

        let hash_lower = hash.to_lowercase();
        let ids = file_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join("|");
        let priority = priority.as_qb().to_string();

        self.post_form(
            "/api/v2/torrents/filePrio",
            &[("hash", &hash_lower), ("id", &ids), ("priority", &priority)],
        )
        .await?;
        Ok(())
    }

    async fn pause_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        self.post_form("/api/v2/torrents/pause", &[("hashes", &hash_lower)])
            .await?;
        Ok(())
    }

    async fn resume_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        self.post_form("/api/v2/torrents/resume", &[("hashes", &hash_lower)])
            .await?;
        Ok(())
    }

    async fn remove_torrent(&self, hash: &str, delete_files: bool) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        let delete_str = if delete_files { "true" } else { "false" };

        self.post_form(
            "/api/v2/torrents/delete",
            &[("hashes", &hash_lower), ("deleteFiles", delete_str)],
        )
        .await?;
        Ok(())
    }

    async fn recheck_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        self.post_form("/api/v2/torrents/recheck", &[("hashes", &hash_lower)])
            .await?;
        Ok(())
    }
}
