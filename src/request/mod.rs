//! Request Module
//!
//! Describes what to load, how to transform it, and the cache key it lives under.
//!
//! Keys are the request URI (or stable key) followed by one separator-terminated
//! token per option, so invalidating a URI is a key-prefix removal.

mod handler;
mod transform;

use std::fmt;
use std::sync::Arc;

use crate::bitmap::{expected_len, PixelFormat};
use crate::cache::KEY_SEPARATOR;
use crate::error::{CacheError, Result};

pub use handler::{FileRequestHandler, HandlerRegistry, MemoryRequestHandler, RequestHandler};
pub use transform::{CenterCrop, Grayscale, Scale, Transformation};

// == Memory Policy ==
/// Per-request cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryPolicy {
    /// Skip the memory cache lookup and always run a handler
    pub skip_cache_read: bool,
    /// Do not store the loaded result in the memory cache
    pub skip_cache_write: bool,
}

// == Request ==
/// An immutable image request. Build with [`Request::builder`].
#[derive(Clone)]
pub struct Request {
    uri: String,
    stable_key: Option<String>,
    transformations: Vec<Arc<dyn Transformation>>,
    memory_policy: MemoryPolicy,
}

impl Request {
    pub fn builder(uri: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            uri: uri.into(),
            stable_key: None,
            resize: None,
            center_crop: false,
            transformations: Vec::new(),
            memory_policy: MemoryPolicy::default(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI scheme, without the `://`.
    pub fn scheme(&self) -> Option<&str> {
        self.uri.split_once("://").map(|(scheme, _)| scheme)
    }

    pub fn memory_policy(&self) -> MemoryPolicy {
        self.memory_policy
    }

    /// Transformations in the order they are applied, size options first.
    pub fn transformations(&self) -> &[Arc<dyn Transformation>] {
        &self.transformations
    }

    // == Key ==
    /// Cache key: `<stable key or uri>\n` then `<transformation key>\n` for each
    /// transformation.
    pub fn key(&self) -> String {
        let mut key = String::with_capacity(self.uri.len() + 32);
        key.push_str(self.stable_key.as_deref().unwrap_or(&self.uri));
        key.push(KEY_SEPARATOR);
        for transformation in &self.transformations {
            key.push_str(&transformation.key());
            key.push(KEY_SEPARATOR);
        }
        key
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("uri", &self.uri)
            .field("key", &self.key())
            .field("memory_policy", &self.memory_policy)
            .finish()
    }
}

// == Request Builder ==
/// Builder for [`Request`].
pub struct RequestBuilder {
    uri: String,
    stable_key: Option<String>,
    resize: Option<(u32, u32)>,
    center_crop: bool,
    transformations: Vec<Arc<dyn Transformation>>,
    memory_policy: MemoryPolicy,
}

impl RequestBuilder {
    /// Caches under `key` instead of the URI, for URIs that change while the
    /// image does not (signed URLs, cache busters).
    pub fn stable_key(mut self, key: impl Into<String>) -> Self {
        self.stable_key = Some(key.into());
        self
    }

    /// Scales the loaded image to exactly `width` x `height`.
    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.resize = Some((width, height));
        self
    }

    /// With [`resize`](Self::resize), crops to the target aspect ratio before
    /// scaling instead of stretching.
    pub fn center_crop(mut self) -> Self {
        self.center_crop = true;
        self
    }

    /// Appends a transformation, applied after any resize.
    pub fn transform(mut self, transformation: impl Transformation + 'static) -> Self {
        self.transformations.push(Arc::new(transformation));
        self
    }

    pub fn memory_policy(mut self, policy: MemoryPolicy) -> Self {
        self.memory_policy = policy;
        self
    }

    pub fn skip_cache_read(mut self) -> Self {
        self.memory_policy.skip_cache_read = true;
        self
    }

    pub fn skip_cache_write(mut self) -> Self {
        self.memory_policy.skip_cache_write = true;
        self
    }

    pub fn build(self) -> Result<Request> {
        if self.uri.is_empty() {
            return Err(CacheError::InvalidKey("Request URI cannot be empty".to_string()));
        }
        if self.uri.contains(KEY_SEPARATOR)
            || self.stable_key.as_deref().is_some_and(|k| k.contains(KEY_SEPARATOR))
        {
            return Err(CacheError::InvalidKey(
                "Request URI and stable key cannot contain a newline".to_string(),
            ));
        }
        if self.stable_key.as_deref() == Some("") {
            return Err(CacheError::InvalidKey("Stable key cannot be empty".to_string()));
        }

        let mut transformations: Vec<Arc<dyn Transformation>> = Vec::new();
        match (self.resize, self.center_crop) {
            (Some((0, _)), _) | (Some((_, 0)), _) => {
                return Err(CacheError::InvalidBitmap(
                    "Resize dimensions must be positive".to_string(),
                ))
            }
            // Sized for the widest format, since the source format is not known yet
            (Some((width, height)), _)
                if expected_len(width, height, PixelFormat::RgbaF16).is_err() =>
            {
                return Err(CacheError::InvalidBitmap(format!(
                    "Resize target {}x{} is too large",
                    width, height
                )))
            }
            (Some((width, height)), true) => {
                transformations.push(Arc::new(CenterCrop::new(width, height)))
            }
            (Some((width, height)), false) => {
                transformations.push(Arc::new(Scale::new(width, height)))
            }
            (None, true) => {
                return Err(CacheError::InvalidBitmap(
                    "Center crop requires a resize".to_string(),
                ))
            }
            (None, false) => {}
        }
        transformations.extend(self.transformations);

        Ok(Request {
            uri: self.uri,
            stable_key: self.stable_key,
            transformations,
            memory_policy: self.memory_policy,
        })
    }
}
