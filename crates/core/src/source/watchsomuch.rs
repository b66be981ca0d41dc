//! WatchSoMuch scraper.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::{SiteConfig, SourcesConfig};

use super::http::{selector, PageFetcher};
use super::parse::{absolute_url, parse_count, parse_size_gb};
use super::{ResultRecord, SourceAdapter, SourceDetails, SourceError};

pub const WATCHSOMUCH: &str = "watchsomuch";

/// Path fragments that identify a detail-page link inside a result block.
const DETAIL_PATH_MARKERS: [&str; 3] = ["/Watch/", "/torrent/", "/episode/"];

/// Scrapes WatchSoMuch episode/torrent listings.
pub struct WatchSoMuchSource {
    fetcher: PageFetcher,
    base_url: String,
}

impl WatchSoMuchSource {
    pub fn new(site: &SiteConfig, sources: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            fetcher: PageFetcher::new(sources)?,
            base_url: site.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!("{}/Search/{}", self.base_url, urlencoding::encode(query))
    }
}

#[async_trait]
impl SourceAdapter for WatchSoMuchSource {
    fn name(&self) -> &str {
        WATCHSOMUCH
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultRecord>, SourceError> {
        let html = self.fetcher.fetch(&self.search_url(query)).await?;
        let records = parse_search_page(&html, &self.base_url, max_results)?;
        debug!(query = query, count = records.len(), "WatchSoMuch search parsed");
        Ok(records)
    }

    async fn fetch_details(&self, locator: &str) -> Result<SourceDetails, SourceError> {
        let url = absolute_url(&self.base_url, locator);
        let html = self.fetcher.fetch(&url).await?;
        parse_details_page(&html)
    }
}

fn span_text(block: &ElementRef<'_>, css: &Selector) -> Option<String> {
    block
        .select(css)
        .next()
        .map(|span| span.text().collect::<String>().trim().to_string())
}

pub(crate) fn parse_search_page(
    html: &str,
    base_url: &str,
    max_results: usize,
) -> Result<Vec<ResultRecord>, SourceError> {
    let document = Html::parse_document(html);
    let episode_block = selector("div.episode-block")?;
    let torrent_item = selector("div.torrent-item")?;
    let title = selector("h3, h4, a")?;
    let anchor = selector("a[href]")?;
    let size = selector("span.size")?;
    let seeds = selector("span.seeds")?;
    let peers = selector("span.peers")?;

    let mut blocks: Vec<ElementRef<'_>> = document.select(&episode_block).collect();
    if blocks.is_empty() {
        blocks = document.select(&torrent_item).collect();
    }

    let mut records = Vec::new();
    for block in blocks {
        if records.len() >= max_results {
            break;
        }

        let Some(title_el) = block.select(&title).next() else {
            continue;
        };
        let name = title_el.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }

        let Some(href) = block
            .select(&anchor)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| DETAIL_PATH_MARKERS.iter().any(|m| href.contains(m)))
        else {
            continue;
        };

        let mut record = ResultRecord::new(name, absolute_url(base_url, href), WATCHSOMUCH);
        if let Some(text) = span_text(&block, &size) {
            record.size_gb = parse_size_gb(&text);
        }
        if let Some(text) = span_text(&block, &seeds) {
            record.seeds = parse_count(&text);
        }
        if let Some(text) = span_text(&block, &peers) {
            record.leeches = parse_count(&text);
        }
        records.push(record);
    }

    Ok(records)
}

pub(crate) fn parse_details_page(html: &str) -> Result<SourceDetails, SourceError> {
    let document = Html::parse_document(html);
    let magnet_link = selector(r#"a[href^="magnet:"]"#)?;
    let download_button = selector("a.download-torrent, a.btn-download")?;

    let magnet = document
        .select(&magnet_link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .or_else(|| {
            document
                .select(&download_button)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| href.starts_with("magnet:"))
        })
        .map(str::to_string);

    Ok(SourceDetails::from_magnet(magnet, Vec::new()))
}
