//! Configuration Module
//!
//! Handles loading the cache and server configuration from environment variables.
//! The configuration is built once by the entry point and passed explicitly.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};
use crate::executor::ExecutorKind;

/// Default memory cache size: 32 MiB of pixel data.
pub const DEFAULT_MAX_CACHE_BYTES: usize = 32 * 1024 * 1024;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Memory cache bound in bytes
    pub max_cache_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Where image loads run
    pub executor: ExecutorKind,
    /// Directory served by the `file://` handler; None disables it
    pub asset_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_CACHE_BYTES` - Memory cache bound in bytes (default: 32 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `EXECUTOR` - `threaded` or `immediate` (default: threaded)
    /// - `ASSET_DIR` - Root directory for `file://` requests (default: unset)
    pub fn from_env() -> Self {
        Self {
            max_cache_bytes: env::var("MAX_CACHE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CACHE_BYTES),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            executor: env::var("EXECUTOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            asset_dir: env::var_os("ASSET_DIR").map(PathBuf::from),
        }
    }

    /// Rejects settings the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_cache_bytes == 0 {
            return Err(CacheError::InvalidCapacity(
                "MAX_CACHE_BYTES must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cache_bytes: DEFAULT_MAX_CACHE_BYTES,
            server_port: 3000,
            executor: ExecutorKind::default(),
            asset_dir: None,
        }
    }
}
