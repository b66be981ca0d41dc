use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{DocumentStore, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    name TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// A SQLite database holding one row per named document.
#[derive(Clone)]
pub struct SqliteDocuments {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl SqliteDocuments {
    /// Open (or create) the database file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::init(conn, path.display().to_string())
    }

    /// Create an in-memory database (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::init(conn, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Handle to a single named document.
    pub fn document(&self, name: &str) -> SqliteDocumentStore {
        SqliteDocumentStore {
            db: self.clone(),
            name: name.to_string(),
        }
    }
}

/// One named document inside a [`SqliteDocuments`] database.
pub struct SqliteDocumentStore {
    db: SqliteDocuments,
    name: String,
}

impl DocumentStore for SqliteDocumentStore {
    fn describe(&self) -> String {
        format!("{}#{}", self.db.location, self.name)
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        let conn = self.db.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.query_row(
            "SELECT body FROM documents WHERE name = ?1",
            params![self.name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn save(&self, body: &str) -> Result<(), StoreError> {
        let conn = self.db.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO documents (name, body, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![self.name, body, Utc::now().to_rfc3339()],
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}
