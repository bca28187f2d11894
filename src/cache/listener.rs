//! Removal Notification Module
//!
//! Hook invoked whenever an entry leaves the cache, so owners can release
//! whatever resource backs the value.

use serde::Serialize;

// == Removal Cause ==
/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCause {
    /// Evicted as least recently used to respect the size bound
    Evicted,
    /// Overwritten by a put for the same key
    Replaced,
    /// Removed by key or by key prefix
    Explicit,
    /// Removed by a full clear
    Cleared,
}

// == Removal Notice ==
/// Details handed to a [`RemovalListener`] for one removed entry.
#[derive(Debug)]
pub struct RemovalNotice<'a, V> {
    pub key: &'a str,
    pub value: &'a V,
    pub cause: RemovalCause,
    /// The value taking this key's place, for replacements that were stored
    pub replacement: Option<&'a V>,
}

impl<V> RemovalNotice<'_, V> {
    /// True when the entry was pushed out by a put for the same key.
    pub fn is_replacement(&self) -> bool {
        self.cause == RemovalCause::Replaced
    }

    /// True only for size-pressure evictions.
    pub fn was_evicted(&self) -> bool {
        self.cause == RemovalCause::Evicted
    }
}

// == Removal Listener ==
/// Receives a notice for every entry removed from the cache.
///
/// Runs while the cache is borrowed mutably (or locked, for a shared cache):
/// implementations must not call back into the same cache.
pub trait RemovalListener<V>: Send + Sync {
    fn on_removal(&self, notice: &RemovalNotice<'_, V>);
}

impl<V, F> RemovalListener<V> for F
where
    F: Fn(&RemovalNotice<'_, V>) + Send + Sync,
{
    fn on_removal(&self, notice: &RemovalNotice<'_, V>) {
        self(notice)
    }
}
