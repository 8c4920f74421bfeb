//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with their estimated size.

use crate::cache::size::{entry_size, EstimateSize};

// == Cache Entry ==
/// Represents a single cache entry with key, value and size metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// Key the entry is indexed under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Estimated size of key plus value in bytes
    pub size: usize,
}

impl<K, V> CacheEntry<K, V>
where
    K: EstimateSize,
    V: EstimateSize,
{
    // == Constructor ==
    /// Creates a new cache entry, estimating its size.
    pub fn new(key: K, value: V) -> Self {
        let size = entry_size(&key, &value);
        Self { key, value, size }
    }
}

impl<K, V> CacheEntry<K, V> {
    // == Replace ==
    /// Swaps in a new value and size, returning the previous size.
    pub fn replace(&mut self, value: V, size: usize) -> usize {
        self.value = value;
        std::mem::replace(&mut self.size, size)
    }
}
