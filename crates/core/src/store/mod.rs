//! Persistent blacklist and submission history.
//!
//! Both are whole-document stores: loaded once at start and rewritten on
//! every mutation through a [`DocumentStore`] backend (JSON files or SQLite).

mod blacklist;
mod document;
mod history;
mod json_file;
mod memory;
mod sqlite;

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageConfig};

pub use blacklist::Blacklist;
pub use document::{DocumentStore, StoreError};
pub use history::{History, HistoryEntry};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::{SqliteDocumentStore, SqliteDocuments};

/// The loaded stores.
#[derive(Clone)]
pub struct Stores {
    pub blacklist: Arc<Blacklist>,
    pub history: Arc<History>,
}

impl Stores {
    /// Open the configured backend and load both documents.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let (blacklist, history): (Arc<dyn DocumentStore>, Arc<dyn DocumentStore>) =
            match config.backend {
                StorageBackend::Json => (
                    Arc::new(JsonFileStore::new(&config.blacklist_path)),
                    Arc::new(JsonFileStore::new(&config.history_path)),
                ),
                StorageBackend::Sqlite => {
                    let db = SqliteDocuments::open(&config.sqlite_path)?;
                    (Arc::new(db.document("blacklist")), Arc::new(db.document("history")))
                }
            };

        info!(backend = ?config.backend, "Opening stores");
        Ok(Self {
            blacklist: Arc::new(Blacklist::load(blacklist)),
            history: Arc::new(History::load(history)),
        })
    }

    /// Empty in-memory stores (useful for testing).
    pub fn in_memory() -> Self {
        Self {
            blacklist: Arc::new(Blacklist::load(Arc::new(MemoryStore::new()))),
            history: Arc::new(History::load(Arc::new(MemoryStore::new()))),
        }
    }
}
