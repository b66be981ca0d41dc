use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::{DocumentStore, StoreError};

/// One successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub hash: String,
    pub name: String,
    pub source: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub added_at: DateTime<Utc>,
    pub magnet: String,
}

impl HistoryEntry {
    /// Entry stamped with the current time.
    pub fn now(
        hash: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        magnet: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            source: source.into(),
            added_at: Utc::now(),
            magnet: magnet.into(),
        }
    }
}

/// Accepts RFC 3339 and offset-less ISO-8601 timestamps (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Append-only log of submissions.
pub struct History {
    store: Arc<dyn DocumentStore>,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl History {
    /// Load from the store. A missing or unreadable document yields an empty log.
    pub fn load(store: Arc<dyn DocumentStore>) -> Self {
        let entries = match store.load() {
            Ok(Some(body)) => serde_json::from_str::<Vec<HistoryEntry>>(&body).unwrap_or_else(|e| {
                warn!(store = %store.describe(), error = %e, "Malformed history, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "Failed to read history, starting empty");
                Vec::new()
            }
        };

        info!(store = %store.describe(), count = entries.len(), "History loaded");
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Append an entry and rewrite the document.
    ///
    /// The entry stays in memory even if the write fails.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(entry);

        let result = serde_json::to_string_pretty(&*entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))
            .and_then(|body| self.store.save(&body));

        if let Err(e) = &result {
            warn!(store = %self.store.describe(), error = %e, "Failed to persist history");
        }
        result
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
