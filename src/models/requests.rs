//! Request DTOs for the cache inspection API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::error::Result;
use crate::request::{Grayscale, Request};

/// Request body for POST /invalidate
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// URI (or stable key) whose cached variants are dropped
    pub prefix: String,
}

impl InvalidateRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.prefix.is_empty() {
            return Some("Prefix cannot be empty".to_string());
        }
        None
    }
}

/// Request body for PUT /resize
#[derive(Debug, Clone, Deserialize)]
pub struct ResizeRequest {
    /// New cache bound in bytes
    pub max_size: usize,
}

/// Request body for POST /load
///
/// # Fields
/// - `uri`: image URI, e.g. `file://icons/a.px` or `mem://logo`
/// - `stable_key`: cache under this key instead of the URI
/// - `resize`: `[width, height]` target size
/// - `center_crop`: crop to the target aspect ratio before resizing
/// - `grayscale`: convert to grayscale after resizing
/// - `skip_cache_read` / `skip_cache_write`: memory policy flags
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadRequest {
    pub uri: String,
    #[serde(default)]
    pub stable_key: Option<String>,
    #[serde(default)]
    pub resize: Option<[u32; 2]>,
    #[serde(default)]
    pub center_crop: bool,
    #[serde(default)]
    pub grayscale: bool,
    #[serde(default)]
    pub skip_cache_read: bool,
    #[serde(default)]
    pub skip_cache_write: bool,
}

impl LoadRequest {
    /// Builds the image request, validating it on the way.
    pub fn into_request(self) -> Result<Request> {
        let mut builder = Request::builder(self.uri);
        if let Some(key) = self.stable_key {
            builder = builder.stable_key(key);
        }
        if let Some([width, height]) = self.resize {
            builder = builder.resize(width, height);
        }
        if self.center_crop {
            builder = builder.center_crop();
        }
        if self.grayscale {
            builder = builder.transform(Grayscale);
        }
        if self.skip_cache_read {
            builder = builder.skip_cache_read();
        }
        if self.skip_cache_write {
            builder = builder.skip_cache_write();
        }
        builder.build()
    }
}
