//! Cache Statistics Module
//!
//! Tracks cache performance metrics including puts, hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of cache counters and occupancy.
///
/// Counters are monotonic for the lifetime of the cache; `clear` does not
/// reset them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of put operations, including replacements and rejected oversize puts
    pub put_count: u64,
    /// Number of successful cache retrievals
    pub hit_count: u64,
    /// Number of failed cache retrievals
    pub miss_count: u64,
    /// Number of entries evicted to respect the size bound
    pub eviction_count: u64,
    /// Current total size of all entries in bytes
    pub size: usize,
    /// Size bound in bytes
    pub max_size: usize,
    /// Current number of entries in the cache
    pub entry_count: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    // == Record Put ==
    pub fn record_put(&mut self) {
        self.put_count += 1;
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }
}
