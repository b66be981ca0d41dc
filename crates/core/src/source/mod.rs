//! Torrent source adapters.
//!
//! Each adapter scrapes one website: a search listing into [`ResultRecord`]s
//! and a detail page into [`SourceDetails`].

mod http;
mod leetx;
mod parse;
mod types;
mod watchsomuch;

use std::sync::Arc;

use crate::config::SourcesConfig;

pub use leetx::{LeetxSource, LEETX};
pub use parse::{info_hash_from_magnet, parse_size_gb};
pub use types::{ResultRecord, SourceAdapter, SourceDetails, SourceError};
pub use watchsomuch::{WatchSoMuchSource, WATCHSOMUCH};

/// Build the adapters enabled in configuration.
pub fn build_sources(config: &SourcesConfig) -> Result<Vec<Arc<dyn SourceAdapter>>, SourceError> {
    let mut sources: Vec<Arc<dyn SourceAdapter>> = Vec::new();
    if config.leetx.enabled {
        sources.push(Arc::new(LeetxSource::new(&config.leetx, config)?));
    }
    if config.watchsomuch.enabled {
        sources.push(Arc::new(WatchSoMuchSource::new(&config.watchsomuch, config)?));
    }
    Ok(sources)
}
