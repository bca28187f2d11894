//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and byte-sized
//! eviction.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::cache::{
    CacheEntry, CacheStats, LruTracker, RemovalCause, RemovalListener, RemovalNotice, Sizer,
    KEY_SEPARATOR,
};
use crate::error::{CacheError, Result};

// == Sized LRU Cache ==
/// LRU cache bounded by the total size of its values rather than their count.
///
/// `size()` always equals the sum of entry sizes, and `size() <= max_size()`
/// holds after every operation returns. Values larger than the whole cache are
/// never stored.
pub struct SizedLruCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Monotonic counters
    stats: CacheStats,
    /// Sum of all entry sizes
    size: usize,
    /// Size bound
    max_size: usize,
    sizer: Box<dyn Sizer<V>>,
    listener: Option<Box<dyn RemovalListener<V>>>,
}

impl<V: Clone> SizedLruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_size` bytes, as measured by `sizer`.
    ///
    /// Fails with [`CacheError::InvalidCapacity`] when `max_size` is zero.
    pub fn new(max_size: usize, sizer: impl Sizer<V> + 'static) -> Result<Self> {
        validate_capacity(max_size)?;
        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            size: 0,
            max_size,
            sizer: Box::new(sizer),
            listener: None,
        })
    }

    /// Registers the hook notified for every removed entry.
    pub fn with_listener(mut self, listener: impl RemovalListener<V> + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// Counts a hit or a miss. Never changes `size()`.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                if let Some(tick) = self.lru.promote(entry.tick) {
                    entry.tick = tick;
                }
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Returns the value for `key` without touching recency or counters.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Put ==
    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// Replacing an existing key applies the size delta and notifies the
    /// listener with [`RemovalCause::Replaced`]. Least recently used entries
    /// are then evicted until the size bound holds. Returns the previous value.
    ///
    /// A value larger than `max_size()` is not stored: the previous value under
    /// `key`, if any, is dropped from the cache and returned, and every other
    /// entry is left alone.
    pub fn put(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }

        let size = self.sizer.size_of(&value);
        self.stats.record_put();

        if size > self.max_size {
            warn!(
                key = %key,
                size,
                max_size = self.max_size,
                "Entry larger than the cache, not storing it"
            );
            return Ok(self.detach(&key, RemovalCause::Replaced));
        }

        let previous = match self.entries.get_mut(&key) {
            Some(entry) => {
                if let Some(tick) = self.lru.promote(entry.tick) {
                    entry.tick = tick;
                }
                let old_value = std::mem::replace(&mut entry.value, value);
                let old_size = std::mem::replace(&mut entry.size, size);
                self.size = self.size - old_size + size;
                notify(
                    self.listener.as_deref(),
                    &key,
                    &old_value,
                    RemovalCause::Replaced,
                    Some(&entry.value),
                );
                Some(old_value)
            }
            None => {
                let tick = self.lru.push(key.clone());
                self.entries.insert(key, CacheEntry::new(value, size, tick));
                self.size += size;
                None
            }
        };

        self.trim_to_size();
        Ok(previous)
    }

    // == Remove ==
    /// Removes the entry for `key`, returning its value.
    ///
    /// Absent keys return None and change nothing.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.detach(key, RemovalCause::Explicit)
    }

    // == Remove By Key Prefix ==
    /// Removes every entry whose key is `prefix` followed by [`KEY_SEPARATOR`].
    ///
    /// Matching is case-sensitive and exact: prefix `"Hello"` removes
    /// `"Hello\nBob!"` but keeps `"Hellos\nWorld!"`. Removals are not counted
    /// as evictions. Returns the number of entries removed.
    pub fn remove_by_key_prefix(&mut self, prefix: &str) -> usize {
        let matching: Vec<String> = self
            .lru
            .iter()
            .filter(|key| has_key_prefix(key, prefix))
            .map(str::to_owned)
            .collect();

        for key in &matching {
            self.detach(key, RemovalCause::Explicit);
        }

        if !matching.is_empty() {
            debug!(prefix = %prefix, removed = matching.len(), "Removed entries by key prefix");
        }
        matching.len()
    }

    // == Clear ==
    /// Removes every entry, oldest first. Counters are kept.
    pub fn clear(&mut self) {
        for key in self.lru.iter() {
            if let Some(entry) = self.entries.remove(key) {
                notify(
                    self.listener.as_deref(),
                    key,
                    &entry.value,
                    RemovalCause::Cleared,
                    None,
                );
            }
        }
        self.lru.clear();
        self.entries.clear();
        self.size = 0;
    }

    // == Resize ==
    /// Changes the size bound and evicts until it holds.
    pub fn resize(&mut self, max_size: usize) -> Result<()> {
        validate_capacity(max_size)?;
        debug!(from = self.max_size, to = max_size, "Resizing cache");
        self.max_size = max_size;
        self.trim_to_size();
        Ok(())
    }

    // == Snapshot ==
    /// Copies all entries, least recently used first, without touching recency.
    pub fn snapshot(&self) -> Vec<(String, V)> {
        self.lru
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|entry| (key.to_string(), entry.value.clone()))
            })
            .collect()
    }

    // == Accessors ==
    /// Current total size of all entries.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the current number of entries in the cache.
    /// Number of entries. The tracker holds exactly one tick per entry.
    pub fn len(&self) -> usize {
        self.lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }

    pub fn put_count(&self) -> u64 {
        self.stats.put_count
    }

    pub fn hit_count(&self) -> u64 {
        self.stats.hit_count
    }

    pub fn miss_count(&self) -> u64 {
        self.stats.miss_count
    }

    pub fn eviction_count(&self) -> u64 {
        self.stats.eviction_count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.size,
            max_size: self.max_size,
            entry_count: self.entries.len(),
            ..self.stats.clone()
        }
    }

    /// Evicts least recently used entries while the cache is over its bound.
    fn trim_to_size(&mut self) {
        while self.size > self.max_size {
            let Some(key) = self.lru.evict_oldest() else {
                break;
            };
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };
            self.size -= entry.size;
            self.stats.record_eviction();
            debug!(key = %key, size = entry.size, "Evicted least recently used entry");
            notify(
                self.listener.as_deref(),
                &key,
                &entry.value,
                RemovalCause::Evicted,
                None,
            );
        }
    }

    /// Unlinks one entry and notifies the listener.
    fn detach(&mut self, key: &str, cause: RemovalCause) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(entry.tick);
        self.size -= entry.size;
        notify(self.listener.as_deref(), key, &entry.value, cause, None);
        Some(entry.value)
    }
}

impl<V> fmt::Debug for SizedLruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizedLruCache")
            .field("len", &self.entries.len())
            .field("size", &self.size)
            .field("max_size", &self.max_size)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// True when `key` is `prefix` followed by the key separator.
pub fn has_key_prefix(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(KEY_SEPARATOR))
}

fn validate_capacity(max_size: usize) -> Result<()> {
    if max_size == 0 {
        return Err(CacheError::InvalidCapacity(
            "max_size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn notify<V>(
    listener: Option<&dyn RemovalListener<V>>,
    key: &str,
    value: &V,
    cause: RemovalCause,
    replacement: Option<&V>,
) {
    if let Some(listener) = listener {
        listener.on_removal(&RemovalNotice {
            key,
            value,
            cause,
            replacement,
        });
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::UnitSizer;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn unit_cache(max_size: usize) -> SizedLruCache<String> {
        SizedLruCache::new(max_size, UnitSizer).unwrap()
    }

    fn byte_cache(max_size: usize) -> SizedLruCache<String> {
        SizedLruCache::new(max_size, |v: &String| v.len()).unwrap()
    }

    type Log = Arc<Mutex<Vec<(String, String, RemovalCause, Option<String>)>>>;

    fn recording(cache: SizedLruCache<String>) -> (SizedLruCache<String>, Log) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        let cache = cache.with_listener(move |notice: &RemovalNotice<'_, String>| {
            sink.lock().push((
                notice.key.to_string(),
                notice.value.clone(),
                notice.cause,
                notice.replacement.cloned(),
            ));
        });
        (cache, log)
    }

    fn keys(cache: &SizedLruCache<String>) -> Vec<String> {
        cache.snapshot().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_store_new() {
        let cache = unit_cache(3);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.max_size(), 3);
    }

    #[test]
    fn test_store_zero_capacity_rejected() {
        let result = SizedLruCache::<String>::new(0, UnitSizer);
        assert!(matches!(result, Err(CacheError::InvalidCapacity(_))));
    }

    #[test]
    fn test_store_empty_key_rejected() {
        let mut cache = unit_cache(3);
        let result = cache.put("", "value".to_string());
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert_eq!(cache.put_count(), 0);
    }

    #[test]
    fn test_store_put_and_get() {
        let mut cache = unit_cache(3);

        assert_eq!(cache.put("key1", "value1".to_string()).unwrap(), None);

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 0);
        assert_eq!(cache.put_count(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut cache = unit_cache(3);

        assert_eq!(cache.get("nonexistent"), None);
        assert_eq!(cache.miss_count(), 1);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut cache = unit_cache(3);

        cache.put("a", "A".to_string()).unwrap();
        cache.put("b", "B".to_string()).unwrap();
        cache.put("c", "C".to_string()).unwrap();
        cache.put("d", "D".to_string()).unwrap();

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.eviction_count(), 1);
        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut cache = unit_cache(3);

        cache.put("a", "A".to_string()).unwrap();
        cache.put("b", "B".to_string()).unwrap();
        cache.put("c", "C".to_string()).unwrap();

        cache.get("a");
        cache.put("d", "D".to_string()).unwrap();

        assert_eq!(keys(&cache), vec!["c", "a", "d"]);
    }

    #[test]
    fn test_store_replace_moves_to_front_without_eviction() {
        let (mut cache, log) = recording(unit_cache(3));

        cache.put("a", "A".to_string()).unwrap();
        cache.put("b", "B".to_string()).unwrap();
        cache.put("c", "C".to_string()).unwrap();

        let previous = cache.put("b", "B2".to_string()).unwrap();

        assert_eq!(previous, Some("B".to_string()));
        assert_eq!(keys(&cache), vec!["a", "c", "b"]);
        assert_eq!(cache.eviction_count(), 0);
        assert_eq!(cache.size(), 3);
        assert_eq!(
            log.lock().as_slice(),
            &[(
                "b".to_string(),
                "B".to_string(),
                RemovalCause::Replaced,
                Some("B2".to_string())
            )]
        );
    }

    #[test]
    fn test_store_replace_applies_size_delta() {
        let mut cache = byte_cache(10);

        cache.put("a", "aaaa".to_string()).unwrap();
        cache.put("b", "bb".to_string()).unwrap();
        assert_eq!(cache.size(), 6);

        cache.put("a", "a".to_string()).unwrap();
        assert_eq!(cache.size(), 3);

        // Growing "b" past the bound evicts "a", the least recently used
        cache.put("b", "bbbbbbbbbb".to_string()).unwrap();
        assert_eq!(cache.size(), 10);
        assert_eq!(keys(&cache), vec!["b"]);
        assert_eq!(cache.eviction_count(), 1);
    }

    #[test]
    fn test_store_evicts_until_fits() {
        let (mut cache, log) = recording(byte_cache(10));

        cache.put("a", "aaa".to_string()).unwrap();
        cache.put("b", "bbb".to_string()).unwrap();
        cache.put("c", "ccc".to_string()).unwrap();
        cache.put("d", "ddddddd".to_string()).unwrap();

        assert_eq!(keys(&cache), vec!["c", "d"]);
        assert_eq!(cache.size(), 10);
        assert_eq!(cache.eviction_count(), 2);

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|(_, _, cause, repl)| {
            *cause == RemovalCause::Evicted && repl.is_none()
        }));
        assert_eq!(log[0].0, "a");
        assert_eq!(log[1].0, "b");
    }

    #[test]
    fn test_store_oversized_entry_not_stored() {
        let (mut cache, log) = recording(byte_cache(5));

        cache.put("a", "aa".to_string()).unwrap();
        cache.put("big", "b".to_string()).unwrap();

        let previous = cache.put("big", "bbbbbbbbbb".to_string()).unwrap();

        assert_eq!(previous, Some("b".to_string()));
        assert!(!cache.contains_key("big"));
        assert_eq!(keys(&cache), vec!["a"]);
        assert_eq!(cache.size(), 2);
        assert_eq!(cache.put_count(), 3);
        assert_eq!(cache.eviction_count(), 0);
        assert_eq!(
            log.lock().as_slice(),
            &[(
                "big".to_string(),
                "b".to_string(),
                RemovalCause::Replaced,
                None
            )]
        );
    }

    #[test]
    fn test_store_remove() {
        let (mut cache, log) = recording(unit_cache(3));

        cache.put("a", "A".to_string()).unwrap();
        let removed = cache.remove("a");

        assert_eq!(removed, Some("A".to_string()));
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.eviction_count(), 0);
        assert_eq!(log.lock()[0].2, RemovalCause::Explicit);
    }

    #[test]
    fn test_store_remove_nonexistent() {
        let mut cache = unit_cache(3);
        cache.put("a", "A".to_string()).unwrap();

        assert_eq!(cache.remove("missing"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_store_remove_by_key_prefix() {
        let mut cache = unit_cache(10);

        cache.put("Hello\nAlice!", "ANSWER!".to_string()).unwrap();
        cache.put("Hello\nBob!", "ANSWER!".to_string()).unwrap();
        cache.put("Hello\nEve!", "ANSWER!".to_string()).unwrap();
        cache.put("Hellos\nWorld!", "ANSWER!".to_string()).unwrap();

        let removed = cache.remove_by_key_prefix("Hello");

        assert_eq!(removed, 3);
        assert_eq!(keys(&cache), vec!["Hellos\nWorld!"]);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.eviction_count(), 0);
    }

    #[test]
    fn test_store_remove_by_key_prefix_is_case_sensitive() {
        let mut cache = unit_cache(10);
        cache.put("hello\nAlice!", "x".to_string()).unwrap();

        assert_eq!(cache.remove_by_key_prefix("Hello"), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_has_key_prefix() {
        assert!(has_key_prefix("Hello\nBob", "Hello"));
        assert!(!has_key_prefix("Hellos\nBob", "Hello"));
        assert!(!has_key_prefix("Hello", "Hello"));
        assert!(!has_key_prefix("Hell", "Hello"));
    }

    #[test]
    fn test_store_clear_keeps_counters() {
        let (mut cache, log) = recording(unit_cache(2));

        cache.put("a", "A".to_string()).unwrap();
        cache.put("b", "B".to_string()).unwrap();
        cache.put("c", "C".to_string()).unwrap();
        cache.get("b");
        cache.get("a");

        let before = cache.stats();
        cache.clear();

        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.put_count(), before.put_count);
        assert_eq!(cache.hit_count(), before.hit_count);
        assert_eq!(cache.miss_count(), before.miss_count);
        assert_eq!(cache.eviction_count(), before.eviction_count);

        let causes: Vec<_> = log.lock().iter().map(|(k, _, c, _)| (k.clone(), *c)).collect();
        assert_eq!(
            causes,
            vec![
                ("a".to_string(), RemovalCause::Evicted),
                ("c".to_string(), RemovalCause::Cleared),
                ("b".to_string(), RemovalCause::Cleared),
            ]
        );
    }

    #[test]
    fn test_store_usable_after_clear() {
        let mut cache = unit_cache(2);
        cache.put("a", "A".to_string()).unwrap();
        cache.put("b", "B".to_string()).unwrap();

        cache.clear();
        assert!(cache.is_empty());

        cache.put("c", "C".to_string()).unwrap();
        cache.put("d", "D".to_string()).unwrap();
        cache.put("e", "E".to_string()).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["d", "e"]);
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_store_resize_trims() {
        let mut cache = unit_cache(4);
        for key in ["a", "b", "c", "d"] {
            cache.put(key, key.to_uppercase()).unwrap();
        }

        cache.resize(2).unwrap();

        assert_eq!(cache.max_size(), 2);
        assert_eq!(keys(&cache), vec!["c", "d"]);
        assert_eq!(cache.eviction_count(), 2);
    }

    #[test]
    fn test_store_resize_zero_rejected() {
        let mut cache = unit_cache(4);
        cache.put("a", "A".to_string()).unwrap();

        assert!(matches!(cache.resize(0), Err(CacheError::InvalidCapacity(_))));
        assert_eq!(cache.max_size(), 4);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_snapshot_order_and_peek() {
        let mut cache = unit_cache(5);
        cache.put("a", "A".to_string()).unwrap();
        cache.put("b", "B".to_string()).unwrap();
        cache.put("c", "C".to_string()).unwrap();

        assert_eq!(cache.peek("a"), Some(&"A".to_string()));
        assert_eq!(
            cache.snapshot(),
            vec![
                ("a".to_string(), "A".to_string()),
                ("b".to_string(), "B".to_string()),
                ("c".to_string(), "C".to_string()),
            ]
        );
        // Neither peek nor snapshot count as accesses
        assert_eq!(cache.hit_count(), 0);
    }

    #[test]
    fn test_store_stats() {
        let mut cache = byte_cache(100);

        cache.put("key1", "value1".to_string()).unwrap();
        cache.get("key1");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.put_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.size, 6);
        assert_eq!(stats.max_size, 100);
        assert_eq!(stats.entry_count, 1);
    }
}
