//! Shared Cache Handle
//!
//! Thread-safe wrapper that puts a single lock around the whole cache store.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore, EstimateSize};
use crate::config::Config;
use crate::error::Result;

/// Cloneable, thread-safe handle to a size-bounded LRU cache.
///
/// Clones share the same underlying store. Every operation holds the lock
/// for its full duration, eviction included, so operations are linearizable.
///
/// ```
/// use mem_vault::Cache;
///
/// let cache: Cache<String, Vec<i32>> = Cache::new(10).unwrap();
/// cache.set("key-1".to_string(), vec![1, 2, 3, 4, 5]);
///
/// assert_eq!(cache.get("key-1"), Some(vec![1, 2, 3, 4, 5]));
/// assert_eq!(cache.delete("key-1"), Some(vec![1, 2, 3, 4, 5]));
/// assert_eq!(cache.get("key-1"), None);
/// ```
pub struct Cache<K, V> {
    inner: Arc<Mutex<CacheStore<K, V>>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + EstimateSize,
    V: EstimateSize,
{
    /// Creates a new cache bounded to `capacity_mb` megabytes.
    ///
    /// Fails with [`CacheError::InvalidCapacity`](crate::CacheError::InvalidCapacity)
    /// when `capacity_mb <= 0`.
    pub fn new(capacity_mb: i64) -> Result<Self> {
        Ok(Self::from_store(CacheStore::new(capacity_mb)?))
    }

    /// Creates a new cache from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(config.capacity_mb)
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Stores a key-value pair, evicting least recently used entries as needed.
    pub fn set(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    /// Returns a copy of the value and marks it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Removes an entry, returning its value. No-op for absent keys.
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().delete(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Estimated bytes held by all entries.
    pub fn current_size(&self) -> usize {
        self.inner.lock().current_size()
    }

    /// Memory bound in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Verifies internal bookkeeping under the lock.
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.lock().check_invariants()
    }
}
