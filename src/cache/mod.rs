//! Cache Module
//!
//! Provides an in-memory cache bounded by estimated byte size with LRU eviction.

mod entry;
mod lru;
mod shared;
mod size;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::{RecencyList, SlotId};
pub use shared::Cache;
pub use size::{
    entry_size, estimate_size, EstimateSize, Items, Opaque, Pairs, Shape, HANDLE_SIZE, MAP_HEADER,
    MAX_DEPTH, SEQUENCE_HEADER, TEXT_HEADER,
};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Bytes per megabyte of configured capacity
pub const BYTES_PER_MB: usize = 1024 * 1024;
