//! Cache Module
//!
//! Provides an in-memory LRU cache bounded by the byte size of its values,
//! with statistics, removal notifications and key-prefix invalidation.

mod entry;
mod listener;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Sizer, UnitSizer};
pub use listener::{RemovalCause, RemovalListener, RemovalNotice};
pub use lru::LruTracker;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::{has_key_prefix, SizedLruCache};

// == Public Constants ==
/// Separates the URI part of a key from its request parameters.
///
/// Prefix invalidation only matches a prefix that is followed by this separator.
pub const KEY_SEPARATOR: char = '\n';
