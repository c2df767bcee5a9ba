//! Per-run memoization shared by resolver threads

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Memo table owned by one resolver for the lifetime of one analysis run.
/// Thread-safe for concurrent access; values are shared behind `Arc`.
pub struct RunCache<K, V> {
    entries: DashMap<K, Arc<V>>,
}

impl<K, V> RunCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        RunCache {
            entries: DashMap::new(),
        }
    }

    /// Return the cached value for `key`, computing it on first use.
    ///
    /// `compute` runs outside the map lock, so it may consult the cache
    /// for other keys. Two threads racing on the same key may both compute;
    /// the first insert wins.
    pub fn get_or_insert_with(&self, key: &K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some(hit) = self.entries.get(key) {
            return Arc::clone(hit.value());
        }
        let value = Arc::new(compute());
        Arc::clone(
            self.entries
                .entry(key.clone())
                .or_insert(value)
                .value(),
        )
    }

    /// Look up a value without computing it.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for RunCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_computes_once_per_key() {
        let cache: RunCache<String, usize> = RunCache::new();
        let calls = AtomicUsize::new(0);

        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            42
        };
        assert_eq!(*cache.get_or_insert_with(&"a".to_string(), compute), 42);
        assert_eq!(*cache.get_or_insert_with(&"a".to_string(), || 7), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&"b".to_string()).is_none());
    }

    #[test]
    fn test_reentrant_compute() {
        let cache: RunCache<u32, u32> = RunCache::new();
        let outer = cache.get_or_insert_with(&1, || *cache.get_or_insert_with(&2, || 20) + 1);
        assert_eq!(*outer, 21);
        assert_eq!(cache.len(), 2);
    }
}
