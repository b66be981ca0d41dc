use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::source::ResultRecord;

/// Parameters of one aggregated search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Quality tier, e.g. "1080p". Empty or absent disables the filter.
    #[serde(default)]
    pub quality: Option<String>,
    /// Lower size bound in GiB (inclusive). Defaults from config.
    #[serde(default)]
    pub min_size_gb: Option<f64>,
    /// Upper size bound in GiB (inclusive). Defaults from config.
    #[serde(default)]
    pub max_size_gb: Option<f64>,
    /// Restrict to these source names. Absent means every configured source.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn with_size_range(mut self, min_gb: Option<f64>, max_gb: Option<f64>) -> Self {
        self.min_size_gb = min_gb;
        self.max_size_gb = max_gb;
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// Ranked results plus the sources that failed along the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<ResultRecord>,
    /// Source name -> error message for sources that failed.
    pub source_errors: HashMap<String, String>,
}
