pub mod store;
pub mod types;

pub use store::{JsonWatchlistStore, WatchlistStore};
pub use types::PositionRecord;
