//! Session cache of composed transition tiles.

use std::collections::HashMap;
use std::sync::Arc;

use super::TransitionKey;
use crate::pixel::PixelBuffer;

/// Counters describing cache use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of stored transitions
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

/// Flat map from [`TransitionKey`] to a composed tile.
///
/// Entries live for the rest of the session: there is no eviction and no
/// invalidation. Every lookup of a key returns the same shared buffer.
#[derive(Debug, Default, Clone)]
pub struct TransitionCache {
    entries: HashMap<TransitionKey, Arc<PixelBuffer>>,
    hits: u64,
    misses: u64,
}

impl TransitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a transition, counting the hit or miss.
    pub fn get(&mut self, key: &TransitionKey) -> Option<Arc<PixelBuffer>> {
        match self.entries.get(key) {
            Some(buffer) => {
                self.hits += 1;
                Some(Arc::clone(buffer))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up a transition without touching the counters.
    pub fn peek(&self, key: &TransitionKey) -> Option<&Arc<PixelBuffer>> {
        self.entries.get(key)
    }

    /// Store a composed transition and return the shared handle.
    ///
    /// A second insert for the same key replaces the first.
    pub fn insert(&mut self, key: TransitionKey, buffer: PixelBuffer) -> Arc<PixelBuffer> {
        let buffer = Arc::new(buffer);
        self.entries.insert(key, Arc::clone(&buffer));
        buffer
    }

    pub fn contains(&self, key: &TransitionKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats { entries: self.entries.len(), hits: self.hits, misses: self.misses }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Neighbors, TileId};

    fn key(center: u32, neighbors: [u32; 4]) -> TransitionKey {
        TransitionKey::new(TileId(center), Neighbors::from(neighbors))
    }

    #[test]
    fn test_insert_then_get_returns_same_instance() {
        let mut cache = TransitionCache::new();
        let stored = cache.insert(key(1, [2, 1, 1, 1]), PixelBuffer::new(2, 2));
        let fetched = cache.get(&key(1, [2, 1, 1, 1])).expect("should be cached");
        assert!(Arc::ptr_eq(&stored, &fetched));
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let mut cache = TransitionCache::new();
        assert!(cache.get(&key(1, [2, 2, 2, 2])).is_none());
        cache.insert(key(1, [2, 2, 2, 2]), PixelBuffer::new(1, 1));
        cache.get(&key(1, [2, 2, 2, 2]));
        cache.get(&key(1, [2, 2, 2, 2]));

        assert_eq!(cache.stats(), CacheStats { entries: 1, hits: 2, misses: 1 });
    }

    #[test]
    fn test_peek_does_not_count() {
        let mut cache = TransitionCache::new();
        cache.insert(key(3, [3, 3, 3, 3]), PixelBuffer::new(1, 1));
        assert!(cache.peek(&key(3, [3, 3, 3, 3])).is_some());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_distinct_keys_distinct_entries() {
        let mut cache = TransitionCache::new();
        cache.insert(key(1, [1, 2, 1, 1]), PixelBuffer::new(1, 1));
        cache.insert(key(1, [2, 1, 1, 1]), PixelBuffer::new(1, 1));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&key(1, [1, 1, 2, 1])));
    }
}
