//! Memoizing concurrent cache.

use std::hash::Hash;

use dashmap::DashMap;

/// Thread-safe memo table. Values are immutable once written.
///
/// The producer runs without any shard lock held, so it may itself query
/// the same cache. Two threads racing on a missing key may both compute;
/// the first insert is kept and both observe the stored value.
#[derive(Debug)]
pub struct MemoCache<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, V>,
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// Return the cached value for `key`, computing it with `producer` on
    /// first access. Absent results (`None` values) are cached too.
    pub fn get_or_compute(&self, key: &K, producer: impl FnOnce(&K) -> V) -> V {
        if let Some(hit) = self.entries.get(key) {
            log::trace!("cache hit for {:?}", key);
            return hit.value().clone();
        }

        // The read guard is dropped above; computing here holds no lock.
        let value = producer(key);
        log::debug!("cache populated for {:?}", key);
        self.entries
            .entry(key.clone())
            .or_insert(value)
            .value()
            .clone()
    }

    /// Cached value for `key` without computing it.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|v| v.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn computes_once_per_key() {
        let cache: MemoCache<String, Option<u32>> = MemoCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache.get_or_compute(&"a".to_string(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(7)
            });
            assert_eq!(v, Some(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn caches_negative_results() {
        let cache: MemoCache<u32, Option<u32>> = MemoCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let v = cache.get_or_compute(&1, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            });
            assert_eq!(v, None);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.peek(&1), Some(None));
    }

    #[test]
    fn producer_may_reenter_cache() {
        let cache: MemoCache<u32, u32> = MemoCache::new();
        let v = cache.get_or_compute(&2, |_| cache.get_or_compute(&1, |_| 10) + 1);
        assert_eq!(v, 11);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn concurrent_readers_observe_equal_values() {
        let cache: Arc<MemoCache<u32, String>> = Arc::new(MemoCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_compute(&42, |k| format!("value-{}", k)))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "value-42");
        }
        assert_eq!(cache.len(), 1);
    }
}
