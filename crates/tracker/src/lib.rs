pub mod store;
pub mod tracker;

pub use store::{InMemoryStore, PositionStore};
pub use tracker::{DedupPolicy, TradeTracker, TrackerConfig};
