//! Download client abstraction.
//!
//! The `TorrentClient` trait covers what the submission policy and the
//! monitor need from the engine; qBittorrent is the shipped backend.

mod qbittorrent;
mod types;

pub use qbittorrent::{parse_qb_state, QBittorrentClient};
pub use types::*;
