use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{DocumentStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct BlacklistDocument {
    #[serde(default)]
    hashes: Vec<String>,
}

/// Persistent set of condemned info hashes.
///
/// Every mutation rewrites the whole document while holding the lock, so
/// concurrent writers never interleave. If a save fails the in-memory set
/// keeps the change, the error is returned, and the next mutation retries
/// the save even when it changes nothing.
pub struct Blacklist {
    store: Arc<dyn DocumentStore>,
    hashes: Mutex<BTreeSet<String>>,
    /// Set while the document lags behind the in-memory set.
    dirty: AtomicBool,
}

impl Blacklist {
    /// Load from the store. A missing or unreadable document yields an empty set.
    pub fn load(store: Arc<dyn DocumentStore>) -> Self {
        let hashes = match store.load() {
            Ok(Some(body)) => match serde_json::from_str::<BlacklistDocument>(&body) {
                Ok(doc) => doc.hashes.iter().map(|h| normalize(h)).collect(),
                Err(e) => {
                    warn!(store = %store.describe(), error = %e, "Malformed blacklist, starting empty");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(store = %store.describe(), error = %e, "Failed to read blacklist, starting empty");
                BTreeSet::new()
            }
        };

        info!(store = %store.describe(), count = hashes.len(), "Blacklist loaded");
        Self {
            store,
            hashes: Mutex::new(hashes),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.lock().contains(&normalize(hash))
    }

    /// Add a hash. Returns whether it was newly inserted.
    pub fn add(&self, hash: &str) -> Result<bool, StoreError> {
        let mut hashes = self.lock();
        let inserted = hashes.insert(normalize(hash));
        if inserted || self.is_dirty() {
            self.persist(&hashes)?;
        }
        Ok(inserted)
    }

    /// Remove a hash. Removing an absent hash is a no-op.
    pub fn remove(&self, hash: &str) -> Result<bool, StoreError> {
        let mut hashes = self.lock();
        let removed = hashes.remove(&normalize(hash));
        if removed || self.is_dirty() {
            self.persist(&hashes)?;
        }
        Ok(removed)
    }

    /// All hashes, sorted.
    pub fn hashes(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.hashes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Called with the set lock held.
    fn persist(&self, hashes: &BTreeSet<String>) -> Result<(), StoreError> {
        let doc = BlacklistDocument {
            hashes: hashes.iter().cloned().collect(),
        };
        let result = serde_json::to_string_pretty(&doc)
            .map_err(|e| StoreError::Serialization(e.to_string()))
            .and_then(|body| self.store.save(&body));

        self.dirty.store(result.is_err(), Ordering::SeqCst);
        if let Err(e) = &result {
            warn!(store = %self.store.describe(), error = %e, "Failed to persist blacklist");
        }
        result
    }
}

fn normalize(hash: &str) -> String {
    hash.trim().to_lowercase()
}
