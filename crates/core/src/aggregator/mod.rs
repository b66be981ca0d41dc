//! Search aggregation across source adapters.

mod filter;
mod search;
mod types;

pub use filter::{has_extension, has_media_payload, matches_quality, within_size};
pub use search::Aggregator;
pub use types::{SearchOutcome, SearchRequest};
