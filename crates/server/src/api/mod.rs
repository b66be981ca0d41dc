pub mod blacklist;
pub mod download;
pub mod handlers;
pub mod monitor;
pub mod routes;
pub mod search;
pub mod torrents;

pub use routes::create_router;
