use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{DocumentStore, StoreError};

/// Keeps a document in memory. Saves can be made to fail for testing.
#[derive(Default)]
pub struct MemoryStore {
    body: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing document body.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Mutex::new(Some(body.into())),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Current persisted body.
    pub fn body(&self) -> Option<String> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DocumentStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.body())
    }

    fn save(&self, body: &str) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        *self.body.lock().unwrap_or_else(PoisonError::into_inner) = Some(body.to_string());
        Ok(())
    }
}
