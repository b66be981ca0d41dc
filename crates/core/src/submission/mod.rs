//! Submitting a chosen result to the download client.
//!
//! A submission adds the magnet, appends a history entry and then, in the
//! background, marks excluded non-media files inside the torrent as skipped.

mod policy;
mod types;

pub use policy::{MetadataWait, SubmissionPolicy};
pub use types::{PriorityOutcome, SubmissionError, SubmissionReceipt};
