//! 1337x scraper.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::config::{SiteConfig, SourcesConfig};

use super::http::{selector, PageFetcher};
use super::parse::{absolute_url, parse_count, parse_size_gb};
use super::{ResultRecord, SourceAdapter, SourceDetails, SourceError};

/// Adapter name stamped on 1337x records.
pub const LEETX: &str = "leetx";

/// Scrapes the 1337x search listing and torrent pages.
pub struct LeetxSource {
    fetcher: PageFetcher,
    base_url: String,
}

impl LeetxSource {
    pub fn new(site: &SiteConfig, sources: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            fetcher: PageFetcher::new(sources)?,
            base_url: site.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str) -> String {
        format!("{}/search/{}/1/", self.base_url, urlencoding::encode(query))
    }
}

#[async_trait]
impl SourceAdapter for LeetxSource {
    fn name(&self) -> &str {
        LEETX
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<ResultRecord>, SourceError> {
        let html = self.fetcher.fetch(&self.search_url(query)).await?;
        let records = parse_search_page(&html, &self.base_url, max_results)?;
        debug!(query = query, count = records.len(), "1337x search parsed");
        Ok(records)
    }

    async fn fetch_details(&self, locator: &str) -> Result<SourceDetails, SourceError> {
        let url = absolute_url(&self.base_url, locator);
        let html = self.fetcher.fetch(&url).await?;
        parse_details_page(&html)
    }
}

fn cell_text(row: &ElementRef<'_>, css: &scraper::Selector) -> String {
    row.select(css)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Parse the search listing. Rows without a name link are skipped.
pub(crate) fn parse_search_page(
    html: &str,
    base_url: &str,
    max_results: usize,
) -> Result<Vec<ResultRecord>, SourceError> {
    let document = Html::parse_document(html);
    let rows = selector("table.table-list tbody tr")?;
    let name_cell = selector("td.coll-1")?;
    let anchor = selector("a")?;
    let seeds = selector("td.coll-2")?;
    let leeches = selector("td.coll-3")?;
    let size = selector("td.coll-4")?;

    let mut records = Vec::new();
    for row in document.select(&rows) {
        if records.len() >= max_results {
            break;
        }
        let Some(cell) = row.select(&name_cell).next() else {
            continue;
        };
        // The first anchor is the category icon; the second is the title link.
        let Some(link) = cell.select(&anchor).nth(1) else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let name = link.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }

        let mut record = ResultRecord::new(name, absolute_url(base_url, href), LEETX);
        record.seeds = parse_count(&cell_text(&row, &seeds));
        record.leeches = parse_count(&cell_text(&row, &leeches));
        record.size_gb = parse_size_gb(&cell_text(&row, &size));
        records.push(record);
    }

    Ok(records)
}

/// Parse a torrent page for its magnet and file listing.
pub(crate) fn parse_details_page(html: &str) -> Result<SourceDetails, SourceError> {
    let document = Html::parse_document(html);
    let magnet_link = selector(r#"a[href^="magnet:?"]"#)?;
    let file_item = selector("div.file-content li")?;

    let magnet = document
        .select(&magnet_link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    let files = document
        .select(&file_item)
        .map(|li| li.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    Ok(SourceDetails::from_magnet(magnet, files))
}
