//! Jellyfin library notifier.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::MediaLibraryConfig;

use super::{LibraryError, LibraryNotifier};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Triggers Jellyfin library scans through its REST API.
pub struct JellyfinNotifier {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SystemInfo {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MediaFolders {
    #[serde(default)]
    items: Vec<MediaFolder>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MediaFolder {
    id: String,
    #[serde(default)]
    locations: Vec<String>,
}

fn map_request_error(e: reqwest::Error) -> LibraryError {
    if e.is_timeout() {
        LibraryError::Timeout
    } else if e.is_connect() {
        LibraryError::ConnectionFailed(e.to_string())
    } else {
        LibraryError::ApiError(e.to_string())
    }
}

impl JellyfinNotifier {
    pub fn new(config: &MediaLibraryConfig) -> Result<Self, LibraryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LibraryError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Build the notifier and probe the server. An unreachable server is
    /// logged, not fatal: notifications are best-effort.
    pub async fn connect(config: &MediaLibraryConfig) -> Result<Self, LibraryError> {
        let notifier = Self::new(config)?;
        match notifier.system_version().await {
            Ok(version) => info!(url = %notifier.url, version = %version, "Connected to Jellyfin"),
            Err(e) => warn!(url = %notifier.url, error = %e, "Jellyfin health check failed"),
        }
        Ok(notifier)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("X-Emby-Token", &self.api_key)
    }

    async fn system_version(&self) -> Result<String, LibraryError> {
        let response = self
            .request(self.client.get(format!("{}/System/Info", self.url)))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(LibraryError::ApiError(format!("HTTP {}", response.status())));
        }

        let info: SystemInfo = response
            .json()
            .await
            .map_err(|e| LibraryError::ApiError(format!("Failed to parse response: {}", e)))?;
        Ok(info.version.unwrap_or_else(|| "unknown".to_string()))
    }

    async fn media_folders(&self) -> Result<Vec<MediaFolder>, LibraryError> {
        let response = self
            .request(self.client.get(format!("{}/Library/MediaFolders", self.url)))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(LibraryError::ApiError(format!("HTTP {}", response.status())));
        }

        let folders: MediaFolders = response
            .json()
            .await
            .map_err(|e| LibraryError::ApiError(format!("Failed to parse response: {}", e)))?;
        Ok(folders.items)
    }

    async fn refresh(&self, library_id: Option<&str>) -> Result<(), LibraryError> {
        let builder = match library_id {
            Some(id) => self
                .client
                .post(format!("{}/Items/{}/Refresh", self.url, urlencoding::encode(id)))
                .query(&[
                    ("Recursive", "true"),
                    ("ImageRefreshMode", "Default"),
                    ("MetadataRefreshMode", "Default"),
                    ("ReplaceAllImages", "false"),
                    ("ReplaceAllMetadata", "false"),
                ]),
            None => self.client.post(format!("{}/Library/Refresh", self.url)),
        };

        let response = self
            .request(builder)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(LibraryError::ApiError(format!(
                "scan request failed: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Id of the first folder with a location that contains `path`.
fn library_for_path(folders: &[MediaFolder], path: &str) -> Option<String> {
    let path = Path::new(path);
    folders
        .iter()
        .find(|folder| folder.locations.iter().any(|loc| path.starts_with(loc)))
        .map(|folder| folder.id.clone())
}

#[async_trait]
impl LibraryNotifier for JellyfinNotifier {
    fn name(&self) -> &str {
        "jellyfin"
    }

    async fn media_added(&self, path: Option<&str>) -> Result<(), LibraryError> {
        let library_id = match path {
            Some(path) => match self.media_folders().await {
                Ok(folders) => library_for_path(&folders, path),
                Err(e) => {
                    debug!(error = %e, "Could not list Jellyfin libraries, scanning all");
                    None
                }
            },
            None => None,
        };

        self.refresh(library_id.as_deref()).await?;
        info!(
            library = library_id.as_deref().unwrap_or("all"),
            "Jellyfin library scan requested"
        );
        Ok(())
    }
}
