//! Media library rescan notifications.
//!
//! After a download completes the library server is asked to rescan the
//! folder holding it. Notifications are best-effort.

mod jellyfin;

use async_trait::async_trait;
use thiserror::Error;

pub use jellyfin::JellyfinNotifier;

/// Errors from the media library server.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A media library that can be told about new downloads.
#[async_trait]
pub trait LibraryNotifier: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Rescan the library containing `path`, or every library when the
    /// path is unknown or not inside any library.
    async fn media_added(&self, path: Option<&str>) -> Result<(), LibraryError>;
}
