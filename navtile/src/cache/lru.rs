//! Generic bounded cache with least-recently-used eviction.

use std::collections::HashMap;
use std::hash::Hash;

/// Entry wrapper carrying recency bookkeeping.
#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    /// Logical access stamp; larger means more recently used.
    last_used: u64,
}

/// A fixed-capacity key/value store with LRU eviction.
///
/// Capacity is counted in entries. Both `get` and `put` count as a use of
/// the touched key. The cache is not internally synchronized; the owner
/// is expected to serialize access (see [`super::TileCacheManager`]).
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    capacity: usize,
    /// Monotonic counter backing the recency stamps.
    tick: u64,
    evictions: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A zero capacity is clamped to one so `put` can always succeed.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
            evictions: 0,
        }
    }

    /// Look up a value and mark it most-recently-used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            &entry.value
        })
    }

    /// Insert or replace a value, evicting the least-recently-used entry
    /// first if the cache is full.
    pub fn put(&mut self, key: K, value: V) {
        self.tick += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_used: self.tick,
            },
        );
    }

    /// Whether the key is present. Does not update recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity in entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries evicted over the cache's lifetime.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Remove the entry with the smallest recency stamp.
    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }
}
