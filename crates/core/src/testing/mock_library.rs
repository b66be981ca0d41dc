//! Mock media library notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::media_library::{LibraryError, LibraryNotifier};

/// Records every rescan request.
#[derive(Debug, Default)]
pub struct MockLibraryNotifier {
    /// Paths passed to `media_added`, in call order.
    calls: Arc<RwLock<Vec<Option<String>>>>,
    /// If set, every call fails with this message.
    error: Arc<RwLock<Option<String>>>,
    notified: Arc<Notify>,
}

impl MockLibraryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<Option<String>> {
        self.calls.read().await.clone()
    }

    pub async fn set_error(&self, message: impl Into<String>) {
        *self.error.write().await = Some(message.into());
    }

    /// Wait until at least `count` calls were recorded.
    ///
    /// Notifications are sent from spawned tasks, so tests wait on this
    /// instead of sleeping.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.notified.notified();
            if self.calls.read().await.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl LibraryNotifier for MockLibraryNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn media_added(&self, path: Option<&str>) -> Result<(), LibraryError> {
        self.calls.write().await.push(path.map(str::to_string));
        self.notified.notify_waiters();

        match self.error.read().await.clone() {
            Some(message) => Err(LibraryError::ApiError(message)),
            None => Ok(()),
        }
    }
}
