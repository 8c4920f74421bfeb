//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Lookups and deletes of absent keys are not errors; they surface as
/// `Option` results or no-ops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be a positive number of megabytes
    #[error("Invalid capacity: {0} MB (must be greater than zero)")]
    InvalidCapacity(i64),

    /// Capacity in bytes does not fit in the address space
    #[error("Capacity overflow: {0} MB cannot be represented in bytes")]
    CapacityOverflow(i64),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal bookkeeping no longer matches the stored entries
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
