//! Cache Entry Module
//!
//! Defines a single sized cache entry and the strategy used to size values.

// == Sizer ==
/// Computes the byte footprint of a cached value.
///
/// Must be a pure function of the value: the cache calls it once on insertion
/// and trusts the result for the lifetime of the entry.
pub trait Sizer<V>: Send + Sync {
    /// Returns the size of `value` in bytes.
    fn size_of(&self, value: &V) -> usize;
}

impl<V, F> Sizer<V> for F
where
    F: Fn(&V) -> usize + Send + Sync,
{
    fn size_of(&self, value: &V) -> usize {
        self(value)
    }
}

/// Sizes every value as one unit, turning the byte bound into an entry count.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitSizer;

impl<V> Sizer<V> for UnitSizer {
    fn size_of(&self, _value: &V) -> usize {
        1
    }
}

// == Cache Entry ==
/// Represents a single cache entry: the stored value and its size.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Size in bytes as reported by the cache's sizer at insertion time
    pub size: usize,
    /// Recency stamp, larger is more recent
    pub(crate) tick: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry with a precomputed size.
    pub fn new(value: V, size: usize, tick: u64) -> Self {
        Self { value, size, tick }
    }
}
