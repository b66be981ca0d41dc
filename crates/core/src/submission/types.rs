use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent_client::TorrentClientError;

/// Errors surfaced to the caller of a submission.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid magnet link: {0}")]
    InvalidMagnet(String),

    #[error("Download client error: {0}")]
    Client(#[from] TorrentClientError),
}

/// What a successful submission produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Info hash of the added torrent.
    pub hash: String,
    /// Display name recorded in history.
    pub name: String,
    pub source: String,
    /// False when the history entry could not be persisted.
    pub history_saved: bool,
}

/// Result of the file-priority step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PriorityOutcome {
    /// The file list was read; `skipped` files were set to skip.
    Applied { skipped: usize },
    /// Metadata never arrived within the wait budget.
    NoMetadata,
    /// The client refused the priority change.
    Failed,
}
