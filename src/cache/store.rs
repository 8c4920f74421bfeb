//! Cache Store Module
//!
//! Main cache engine combining a HashMap index with a recency list, bounded
//! by the estimated size of its entries.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, warn};

use crate::cache::lru::{RecencyList, SlotId};
use crate::cache::size::EstimateSize;
use crate::cache::{CacheEntry, CacheStats, BYTES_PER_MB};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Cache storage with size-bounded LRU eviction.
///
/// Not synchronized; see [`Cache`](crate::cache::Cache) for the shared handle.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key to list handle
    index: HashMap<K, SlotId>,
    /// Entries ordered by access recency
    entries: RecencyList<CacheEntry<K, V>>,
    /// Sum of all entry sizes in bytes
    current_size: usize,
    /// Memory bound in bytes
    capacity: usize,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + EstimateSize,
    V: EstimateSize,
{
    // == Constructor ==
    /// Creates a new CacheStore bounded to `capacity_mb` megabytes.
    ///
    /// # Errors
    /// - [`CacheError::InvalidCapacity`] if `capacity_mb <= 0`
    /// - [`CacheError::CapacityOverflow`] if the bound does not fit in `usize` bytes
    pub fn new(capacity_mb: i64) -> Result<Self> {
        if capacity_mb <= 0 {
            return Err(CacheError::InvalidCapacity(capacity_mb));
        }
        let capacity = usize::try_from(capacity_mb)
            .ok()
            .and_then(|mb| mb.checked_mul(BYTES_PER_MB))
            .ok_or(CacheError::CapacityOverflow(capacity_mb))?;

        debug!("Cache store created with capacity of {} bytes", capacity);

        Ok(Self {
            index: HashMap::new(),
            entries: RecencyList::new(),
            current_size: 0,
            capacity,
            stats: CacheStats::new(),
        })
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// If the key already exists, the value and size are replaced and the
    /// entry becomes most recently used. Least recently used entries are
    /// evicted until the total fits in capacity again.
    ///
    /// An entry that alone exceeds capacity is not stored. Any previous value
    /// under the same key is removed so it cannot be read back stale.
    pub fn set(&mut self, key: K, value: V) {
        let incoming = CacheEntry::new(key, value);
        let size = incoming.size;

        if size > self.capacity {
            self.remove_entry(&incoming.key);
            self.stats.record_rejection();
            warn!(
                "Rejected entry of {} bytes: exceeds capacity of {} bytes",
                size, self.capacity
            );
            return;
        }

        match self.index.get(&incoming.key) {
            Some(&id) => {
                if let Some(entry) = self.entries.get_mut(id) {
                    let old_size = entry.replace(incoming.value, size);
                    self.current_size = self.current_size - old_size + size;
                }
                self.entries.move_to_front(id);
            }
            None => {
                let key = incoming.key.clone();
                let id = self.entries.push_front(incoming);
                self.index.insert(key, id);
                self.current_size += size;
            }
        }

        while self.current_size > self.capacity {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.entries.move_to_front(id);
        self.stats.record_hit();
        self.entries.get(id).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Retrieves a value without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|entry| &entry.value)
    }

    // == Contains ==
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry by key, returning its value.
    ///
    /// Deleting an absent key is a no-op.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|entry| entry.value)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.len(), self.current_size, self.capacity);
        stats
    }

    // == Keys ==
    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(_, entry)| &entry.key)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Estimated bytes held by all entries.
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    /// Memory bound in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Invariants ==
    /// Verifies that index, recency list and running total agree.
    pub fn check_invariants(&self) -> Result<()> {
        if self.entries.len() != self.index.len() {
            return Err(CacheError::Invariant(format!(
                "list holds {} entries but index holds {}",
                self.entries.len(),
                self.index.len()
            )));
        }

        let mut visited = 0usize;
        let mut total = 0usize;
        for (id, entry) in self.entries.iter() {
            if self.index.get(&entry.key) != Some(&id) {
                return Err(CacheError::Invariant(
                    "list entry has no matching index handle".to_string(),
                ));
            }
            visited += 1;
            total += entry.size;
        }

        if visited != self.index.len() {
            return Err(CacheError::Invariant(format!(
                "walked {} list entries but index holds {}",
                visited,
                self.index.len()
            )));
        }
        if total != self.current_size {
            return Err(CacheError::Invariant(format!(
                "running total is {} bytes but entries sum to {}",
                self.current_size, total
            )));
        }
        if self.current_size > self.capacity {
            return Err(CacheError::Invariant(format!(
                "running total {} exceeds capacity {}",
                self.current_size, self.capacity
            )));
        }
        Ok(())
    }

    // == Eviction ==
    /// Evicts the least recently used entry.
    ///
    /// Returns false if there was nothing to evict.
    fn evict_oldest(&mut self) -> bool {
        let Some(entry) = self.entries.pop_back() else {
            return false;
        };

        self.index.remove(&entry.key);
        self.current_size -= entry.size;
        self.stats.record_eviction();
        debug!("Evicted entry of {} bytes", entry.size);
        true
    }

    fn remove_entry<Q>(&mut self, key: &Q) -> Option<CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.index.remove(key)?;
        let entry = self.entries.remove(id)?;
        self.current_size -= entry.size;
        Some(entry)
    }
}
