//! Remembering typefaces that were already built
//!
//! A fixed-capacity LRU map from [`ResourceKey`] to handle. Lookups refresh
//! recency, so they take the write lock. Entries only leave by eviction:
//! there is no remove, clear or expiry.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::RwLock;

use fontstage_core::types::ResourceKey;

/// Bounded, thread-safe typeface cache
///
/// Two threads missing on the same key may both build and insert; the last
/// insert wins and nothing else is disturbed.
pub struct TypefaceCache<T> {
    entries: RwLock<LruCache<ResourceKey, T>>,
    capacity: NonZeroUsize,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

/// Counters since the cache was built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hits + self.misses;
        if requests == 0 {
            0.0
        } else {
            self.hits as f64 / requests as f64
        }
    }
}

impl<T: Clone> TypefaceCache<T> {
    /// Creates a cache holding at most `capacity` typefaces (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Returns the cached handle and marks it most recently used
    pub fn get(&self, key: &ResourceKey) -> Option<T> {
        let found = self.entries.write().get(key).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Checks presence without touching recency or counters
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.entries.read().contains(key)
    }

    /// Stores `value`, evicting the least recently used entry when full
    pub fn insert(&self, key: ResourceKey, value: T) {
        let displaced = self.entries.write().push(key.clone(), value);
        self.insertions.fetch_add(1, Ordering::Relaxed);

        if let Some((old_key, _)) = displaced {
            if old_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                log::debug!("Typeface cache evicted {}", old_key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.capacity.get(),
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
