use thiserror::Error;

/// Errors raised while reading or writing a persisted document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// A named JSON document that can be read and replaced as a whole.
///
/// Callers serialize access; implementations only need to make a single
/// `save` atomic.
pub trait DocumentStore: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Read the document body. `Ok(None)` when it was never written.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Replace the document body.
    fn save(&self, body: &str) -> Result<(), StoreError>;
}
