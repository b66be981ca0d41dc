//! Types for the torrent source adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::parse::info_hash_from_magnet;

/// One discovered torrent, normalized across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Torrent title as listed by the source.
    pub name: String,
    /// Opaque reference to the source's detail page.
    pub locator: String,
    pub seeds: u32,
    pub leeches: u32,
    /// Size in GiB, parsed from the listing's free-text size.
    pub size_gb: f64,
    /// Identifier of the adapter that produced this record.
    pub source: String,
    /// Magnet URI (present once details are fetched).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
    /// Lowercase 40-hex info hash derived from `magnet`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// File names inside the torrent, when the source lists them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_list: Option<Vec<String>>,
}

impl ResultRecord {
    /// Create a bare listing record with no details attached.
    pub fn new(
        name: impl Into<String>,
        locator: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
            seeds: 0,
            leeches: 0,
            size_gb: 0.0,
            source: source.into(),
            magnet: None,
            hash: None,
            file_list: None,
        }
    }

    /// Attach detail-page data.
    ///
    /// The hash is always re-derived from the magnet so the two never
    /// disagree; a record without a magnet never carries a hash.
    pub fn apply_details(&mut self, details: SourceDetails) {
        self.hash = details.magnet.as_deref().and_then(info_hash_from_magnet);
        self.magnet = details.magnet;
        if !details.files.is_empty() {
            self.file_list = Some(details.files);
        }
    }
}

/// Data scraped from a torrent's detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl SourceDetails {
    /// Build details from a magnet, deriving the info hash from it.
    pub fn from_magnet(magnet: Option<String>, files: Vec<String>) -> Self {
        let hash = magnet.as_deref().and_then(info_hash_from_magnet);
        Self {
            magnet,
            hash,
            files,
        }
    }
}

/// Errors raised by a single source adapter.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Source HTTP error: {0}")]
    Http(String),

    #[error("Failed to parse page: {0}")]
    Parse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A site that can be searched for torrents.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter identifier, stamped on every record it produces.
    fn name(&self) -> &str;

    /// Scrape one page of search results, at most `max_results` rows.
    ///
    /// Markup the adapter does not recognize yields an empty list, not an error.
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<ResultRecord>, SourceError>;

    /// Scrape a detail page for its magnet, hash and file list.
    async fn fetch_details(&self, locator: &str) -> Result<SourceDetails, SourceError>;
}
