//! Shared Cache Module
//!
//! Thread-safe handle over a [`SizedLruCache`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{CacheStats, RemovalListener, SizedLruCache, Sizer};
use crate::error::Result;

// == Shared Cache ==
/// Cloneable, thread-safe handle to one [`SizedLruCache`].
///
/// A single mutex guards the map, the size total and the counters. Reads take
/// it too: `get` reorders entries and bumps counters, and `snapshot` must never
/// observe a half-applied trim.
pub struct SharedCache<V> {
    inner: Arc<Mutex<SizedLruCache<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> SharedCache<V> {
    /// Creates a shared cache bounded to `max_size` as measured by `sizer`.
    pub fn new(max_size: usize, sizer: impl Sizer<V> + 'static) -> Result<Self> {
        Ok(Self::from_cache(SizedLruCache::new(max_size, sizer)?))
    }

    /// Creates a shared cache whose removals are reported to `listener`.
    pub fn with_listener(
        max_size: usize,
        sizer: impl Sizer<V> + 'static,
        listener: impl RemovalListener<V> + 'static,
    ) -> Result<Self> {
        Ok(Self::from_cache(
            SizedLruCache::new(max_size, sizer)?.with_listener(listener),
        ))
    }

    pub fn from_cache(cache: SizedLruCache<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key)
    }

    pub fn put(&self, key: impl Into<String>, value: V) -> Result<Option<V>> {
        self.inner.lock().put(key, value)
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// See [`SizedLruCache::remove_by_key_prefix`]. The whole pass runs under one lock.
    pub fn remove_by_key_prefix(&self, prefix: &str) -> usize {
        self.inner.lock().remove_by_key_prefix(prefix)
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }

    pub fn resize(&self, max_size: usize) -> Result<()> {
        self.inner.lock().resize(max_size)
    }

    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.inner.lock().snapshot()
    }

    pub fn size(&self) -> usize {
        self.inner.lock().size()
    }

    pub fn max_size(&self) -> usize {
        self.inner.lock().max_size()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Runs `f` with exclusive access, for compound operations that must not interleave.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut SizedLruCache<V>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::UnitSizer;
    use std::thread;

    #[test]
    fn test_shared_handles_see_same_cache() {
        let cache = SharedCache::new(10, UnitSizer).unwrap();
        let other = cache.clone();

        cache.put("a", 1u32).unwrap();

        assert_eq!(other.get("a"), Some(1));
        assert_eq!(other.stats().hit_count, 1);
    }

    #[test]
    fn test_shared_concurrent_puts_respect_bound() {
        let cache = SharedCache::new(64, |v: &Vec<u8>| v.len()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(format!("t{}-{}", t, i), vec![0u8; (i % 7) + 1]).unwrap();
                        let _ = cache.get(&format!("t{}-{}", (t + 1) % 4, i));
                        assert!(cache.size() <= 64);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.put_count, 800);
        assert_eq!(stats.hit_count + stats.miss_count, 800);
        let total: usize = cache.snapshot().iter().map(|(_, v)| v.len()).sum();
        assert_eq!(total, cache.size());
    }

    #[test]
    fn test_shared_with_lock_compound_operation() {
        let cache = SharedCache::new(10, UnitSizer).unwrap();
        cache.put("a", 1u32).unwrap();

        let moved = cache.with_lock(|inner| {
            let value = inner.remove("a")?;
            inner.put("b", value + 1).ok()?;
            Some(value)
        });

        assert_eq!(moved, Some(1));
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("a"), None);
    }
}
