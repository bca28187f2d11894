//! Request handlers: where bitmaps come from.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use super::Request;
use crate::bitmap::Bitmap;
use crate::error::{CacheError, Result};

// == Request Handler ==
/// Loads bitmaps for the requests it claims.
pub trait RequestHandler: Send + Sync {
    /// Short name reported as the load source.
    fn name(&self) -> &str;

    fn can_handle(&self, request: &Request) -> bool;

    /// Produces the untransformed bitmap. Called off the caller's thread when
    /// the loader runs on a threaded executor, so blocking I/O is fine.
    fn load(&self, request: &Request) -> Result<Bitmap>;
}

// == Handler Registry ==
/// Ordered list of handlers. The first handler that claims a request wins.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler after all registered ones.
    pub fn register(&mut self, handler: Arc<dyn RequestHandler>) {
        debug!(handler = handler.name(), "Registered request handler");
        self.handlers.push(handler);
    }

    pub fn with(mut self, handler: Arc<dyn RequestHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn resolve(&self, request: &Request) -> Result<&Arc<dyn RequestHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(request))
            .ok_or_else(|| CacheError::Unhandled(request.uri().to_string()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}

// == File Handler ==
/// Serves `file://<relative path>` from a root directory, in the raw bitmap
/// format (see [`Bitmap::decode_raw`]).
#[derive(Debug, Clone)]
pub struct FileRequestHandler {
    root: PathBuf,
}

impl FileRequestHandler {
    pub const SCHEME: &'static str = "file";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a request to a path under the root, refusing anything that escapes it.
    fn resolve_path(&self, request: &Request) -> Result<PathBuf> {
        let relative = request
            .uri()
            .strip_prefix("file://")
            .ok_or_else(|| CacheError::Unhandled(request.uri().to_string()))?;
        let relative = Path::new(relative);

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(CacheError::Load(format!(
                "Path {} is outside the asset directory",
                relative.display()
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl RequestHandler for FileRequestHandler {
    fn name(&self) -> &str {
        "file"
    }

    fn can_handle(&self, request: &Request) -> bool {
        request.scheme() == Some(Self::SCHEME)
    }

    fn load(&self, request: &Request) -> Result<Bitmap> {
        let path = self.resolve_path(request)?;
        debug!(path = %path.display(), "Reading bitmap file");
        let data = std::fs::read(&path)?;
        Bitmap::decode_raw(Bytes::from(data))
    }
}

// == Memory Handler ==
/// Serves `mem://<name>` from bitmaps registered in process.
#[derive(Debug, Default)]
pub struct MemoryRequestHandler {
    images: RwLock<HashMap<String, Bitmap>>,
}

impl MemoryRequestHandler {
    pub const SCHEME: &'static str = "mem";

    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `bitmap` available as `mem://<name>`, replacing any previous one.
    pub fn insert(&self, name: impl Into<String>, bitmap: Bitmap) {
        self.images.write().insert(name.into(), bitmap);
    }

    pub fn remove(&self, name: &str) -> Option<Bitmap> {
        self.images.write().remove(name)
    }
}

impl RequestHandler for MemoryRequestHandler {
    fn name(&self) -> &str {
        "memory"
    }

    fn can_handle(&self, request: &Request) -> bool {
        request.scheme() == Some(Self::SCHEME)
    }

    fn load(&self, request: &Request) -> Result<Bitmap> {
        let name = request.uri().strip_prefix("mem://").unwrap_or_default();
        self.images
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(request.uri().to_string()))
    }
}
