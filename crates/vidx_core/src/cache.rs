//! Segment cache.
//!
//! The cache of loaded index handles belongs to the host engine. The
//! lifecycle code only ever invalidates entries, through [`SegmentCache`].
//! [`InMemorySegmentCache`] is a reference implementation.
//!
//! ## Invariants
//!
//! - Every operation on one key is linearizable: a single lock guards the map
//! - A removed key is never resurrected by a concurrent reader; a reader
//!   either got the handle before removal or misses and reloads

use crate::segment::CacheKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Invalidation interface of the segment cache.
pub trait SegmentCache: Send + Sync {
    /// Returns true if a handle is cached under `key`.
    fn contains(&self, key: &CacheKey) -> bool;

    /// Removes the handle cached under `key`.
    ///
    /// Returns true if an entry was removed.
    fn remove(&self, key: &CacheKey) -> bool;
}

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found a handle.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Handles inserted.
    pub inserts: u64,
    /// Handles removed.
    pub removals: u64,
}

/// A map of cache keys to shared handles.
pub struct InMemorySegmentCache<H> {
    entries: RwLock<HashMap<CacheKey, Arc<H>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    removals: AtomicU64,
}

impl<H> InMemorySegmentCache<H> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            removals: AtomicU64::new(0),
        }
    }

    /// Caches a handle, replacing any previous one.
    pub fn insert(&self, key: CacheKey, handle: H) -> Arc<H> {
        let handle = Arc::new(handle);
        self.entries.write().insert(key, Arc::clone(&handle));
        self.inserts.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// Looks up a handle.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<H>> {
        let found = self.entries.read().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Returns the cached handle, loading and inserting it on a miss.
    ///
    /// The loader runs under the write lock, so a concurrent removal of the
    /// same key either happens before the load or after the insert.
    pub fn get_or_insert_with(&self, key: CacheKey, load: impl FnOnce() -> H) -> Arc<H> {
        if let Some(handle) = self.get(&key) {
            return handle;
        }
        let mut entries = self.entries.write();
        if let Some(handle) = entries.get(&key) {
            return Arc::clone(handle);
        }
        let handle = Arc::new(load());
        entries.insert(key, Arc::clone(&handle));
        self.inserts.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// Returns the cached keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of cached handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
        }
    }
}

impl<H> Default for InMemorySegmentCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Send + Sync> SegmentCache for InMemorySegmentCache<H> {
    fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    fn remove(&self, key: &CacheKey) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.removals.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "vidx::cache", key = %key, "removed segment from cache");
        }
        removed
    }
}
