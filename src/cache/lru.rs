//! LRU Tracker Module
//!
//! Implements Least Recently Used ordering for cache eviction.

use std::collections::BTreeMap;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every tracked key carries a monotonically increasing tick. Keys are stored
/// in a BTreeMap keyed by tick, so:
/// - First entry = Least recently used
/// - Last entry = Most recently used
///
/// Callers keep the current tick of each key (the cache stores it in the
/// entry) and hand it back to promote or remove the key.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Keys ordered by last access tick
    order: BTreeMap<u64, String>,
    /// Tick handed out to the next touched key
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            next_tick: 0,
        }
    }

    // == Push ==
    /// Starts tracking a new key as the most recently used one.
    ///
    /// Returns the tick assigned to the key.
    pub fn push(&mut self, key: String) -> u64 {
        let tick = self.bump();
        self.order.insert(tick, key);
        tick
    }

    // == Promote ==
    /// Moves the key stored at `tick` to the most recently used position.
    ///
    /// Returns the new tick, or None if nothing was tracked at `tick`.
    pub fn promote(&mut self, tick: u64) -> Option<u64> {
        let key = self.order.remove(&tick)?;
        Some(self.push(key))
    }

    // == Remove ==
    /// Stops tracking the key stored at `tick`.
    pub fn remove(&mut self, tick: u64) -> Option<String> {
        self.order.remove(&tick)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_first().map(|(_, key)| key)
    }

    // == Iterate ==
    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.iter().next(), None);
    }

    #[test]
    fn test_lru_push_orders_by_insertion() {
        let mut lru = LruTracker::new();

        lru.push("key1".to_string());
        lru.push("key2".to_string());
        lru.push("key3".to_string());

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.iter().collect::<Vec<_>>(), vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn test_lru_promote_moves_to_back() {
        let mut lru = LruTracker::new();

        let t1 = lru.push("key1".to_string());
        lru.push("key2".to_string());
        lru.push("key3".to_string());

        let new_tick = lru.promote(t1).unwrap();

        assert!(new_tick > t1);
        assert_eq!(lru.len(), 3);
        assert_eq!(lru.iter().collect::<Vec<_>>(), vec!["key2", "key3", "key1"]);
    }

    #[test]
    fn test_lru_promote_stale_tick() {
        let mut lru = LruTracker::new();

        let t1 = lru.push("key1".to_string());
        lru.promote(t1).unwrap();

        assert_eq!(lru.promote(t1), None);
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_lru_evict_oldest() {
        let mut lru = LruTracker::new();

        lru.push("key1".to_string());
        lru.push("key2".to_string());

        assert_eq!(lru.evict_oldest(), Some("key1".to_string()));
        assert_eq!(lru.evict_oldest(), Some("key2".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.push("key1".to_string());
        let t2 = lru.push("key2".to_string());
        lru.push("key3".to_string());

        assert_eq!(lru.remove(t2), Some("key2".to_string()));
        assert_eq!(lru.remove(t2), None);
        assert_eq!(lru.iter().collect::<Vec<_>>(), vec!["key1", "key3"]);
    }

    #[test]
    fn test_lru_order_after_multiple_promotions() {
        let mut lru = LruTracker::new();

        let a = lru.push("a".to_string());
        let b = lru.push("b".to_string());
        let c = lru.push("c".to_string());

        // a, c, b touched in that order: b is newest, a oldest
        lru.promote(a).unwrap();
        lru.promote(c).unwrap();
        lru.promote(b).unwrap();

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.push("a".to_string());
        lru.push("b".to_string());

        lru.clear();

        assert!(lru.is_empty());
        // Ticks keep increasing after a clear
        let t = lru.push("c".to_string());
        assert_eq!(t, 2);
    }
}
