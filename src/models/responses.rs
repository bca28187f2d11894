//! Response DTOs for the cache inspection API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::bitmap::{Bitmap, PixelFormat};
use crate::cache::CacheStats;
use crate::loader::{LoadOutcome, Source};

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Loads currently running
    pub in_flight: usize,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, in_flight: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            in_flight,
        }
    }
}

/// One cached entry in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl SnapshotEntry {
    pub fn new(key: impl Into<String>, bitmap: &Bitmap) -> Self {
        Self {
            key: key.into(),
            bytes: bitmap.byte_count(),
            width: bitmap.width(),
            height: bitmap.height(),
            format: bitmap.format(),
        }
    }
}

/// Response body for GET /snapshot, least recently used first
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub entries: Vec<SnapshotEntry>,
    pub size: usize,
}

/// Response body for DELETE /entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was removed
    pub key: String,
    /// Bytes released
    pub bytes: usize,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>, bytes: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed", key.escape_debug()),
            key,
            bytes,
        }
    }
}

/// Response body for POST /invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub prefix: String,
    pub removed: usize,
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Response body for PUT /resize
#[derive(Debug, Clone, Serialize)]
pub struct ResizeResponse {
    pub max_size: usize,
    pub size: usize,
    pub evicted: u64,
}

/// Response body for POST /load
#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    pub key: String,
    pub bytes: usize,
    pub width: u32,
    pub height: u32,
    pub source: Source,
}

impl From<LoadOutcome> for LoadResponse {
    fn from(outcome: LoadOutcome) -> Self {
        Self {
            bytes: outcome.bitmap.byte_count(),
            width: outcome.bitmap.width(),
            height: outcome.bitmap.height(),
            key: outcome.key,
            source: outcome.source,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
