//! Mem Vault - An in-process cache bounded by estimated memory usage
//!
//! Stores any key/value types whose size can be estimated and evicts the
//! least recently used entries once the configured byte budget is exceeded.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    entry_size, estimate_size, Cache, CacheStats, CacheStore, EstimateSize, Opaque, Shape,
};
pub use config::Config;
pub use error::{CacheError, Result};
