//! Image Loader Module
//!
//! Resolves requests against the memory cache, collapses concurrent identical
//! requests into one load, and runs loads on an [`Executor`].
//!
//! # Load Flow
//! 1. Memory cache lookup by request key (unless the request skips it)
//! 2. If a load for the same key is already running, wait on it
//! 3. Otherwise submit one task: resolve handler, load, transform, store
//! 4. Deliver the result to every caller waiting on that key

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::bitmap::Bitmap;
use crate::cache::{SharedCache, KEY_SEPARATOR};
use crate::error::{CacheError, Result};
use crate::executor::{Executor, TaskHandle};
use crate::request::{HandlerRegistry, Request};

/// Receives the outcome of one load.
pub type Callback = Box<dyn FnOnce(Result<LoadOutcome>) + Send + 'static>;

// == Source ==
/// Where a loaded bitmap came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Served from the memory cache
    Memory,
    /// Produced by the named request handler
    Handler(String),
}

// == Load Outcome ==
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Cache key of the request
    pub key: String,
    pub bitmap: Arc<Bitmap>,
    pub source: Source,
}

// == Image Loader ==
/// Cloneable front door for image loads.
#[derive(Clone)]
pub struct ImageLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    cache: SharedCache<Arc<Bitmap>>,
    handlers: HandlerRegistry,
    executor: Arc<dyn Executor>,
    /// Callers waiting on each running load, by request key
    in_flight: Mutex<HashMap<String, Vec<Callback>>>,
}

impl ImageLoader {
    pub fn new(
        cache: SharedCache<Arc<Bitmap>>,
        handlers: HandlerRegistry,
        executor: Arc<dyn Executor>,
    ) -> Self {
        info!(handlers = ?handlers, "Image loader ready");
        Self {
            inner: Arc::new(LoaderInner {
                cache,
                handlers,
                executor,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn cache(&self) -> &SharedCache<Arc<Bitmap>> {
        &self.inner.cache
    }

    // == Load ==
    /// Loads `request` and hands the outcome to `callback`.
    ///
    /// Cache hits call back before returning. Returns the handle of the
    /// submitted task, or None when the request was answered from memory or
    /// attached to a load already in flight.
    pub fn load(
        &self,
        request: Request,
        callback: impl FnOnce(Result<LoadOutcome>) + Send + 'static,
    ) -> Option<TaskHandle> {
        let key = request.key();

        if !request.memory_policy().skip_cache_read {
            if let Some(bitmap) = self.inner.cache.get(&key) {
                debug!(key = %key.escape_debug(), "Memory cache hit");
                callback(Ok(LoadOutcome {
                    key,
                    bitmap,
                    source: Source::Memory,
                }));
                return None;
            }
        }

        {
            let mut in_flight = self.inner.in_flight.lock();
            if let Some(waiters) = in_flight.get_mut(&key) {
                debug!(key = %key.escape_debug(), waiters = waiters.len() + 1, "Joined in-flight load");
                waiters.push(Box::new(callback));
                return None;
            }
            in_flight.insert(key.clone(), vec![Box::new(callback)]);
        }

        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
            key,
            armed: true,
        };
        Some(self.inner.executor.submit(Box::new(move || {
            let outcome = guard.inner.run(&guard.key, &request);
            guard.finish(outcome);
        })))
    }

    /// [`load`](Self::load) as a future.
    pub async fn load_async(&self, request: Request) -> Result<LoadOutcome> {
        let (tx, rx) = oneshot::channel();
        self.load(request, move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await
            .map_err(|_| CacheError::Internal("Load was dropped before completing".to_string()))?
    }

    /// Drops every cached variant of `uri`. Returns how many were removed.
    pub fn invalidate(&self, uri: &str) -> usize {
        let removed = self.inner.cache.remove_by_key_prefix(uri);
        debug!(uri = %uri, removed, "Invalidated uri");
        removed
    }

    /// Number of distinct keys currently loading.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }
}

impl fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLoader")
            .field("handlers", &self.inner.handlers)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl LoaderInner {
    /// Body of a submitted load task.
    fn run(&self, key: &str, request: &Request) -> Result<LoadOutcome> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.fetch(key, request)))
            .unwrap_or_else(|_| {
                Err(CacheError::Load(format!(
                    "Handler panicked loading {}",
                    request.uri()
                )))
            });

        if let Err(err) = &outcome {
            warn!(uri = %request.uri(), error = %err, "Image load failed");
        }
        outcome
    }

    /// Removes `key` from the in-flight map and hands `outcome` to its waiters.
    ///
    /// The cache already holds a successful result, so later requests hit
    /// memory instead of joining this entry.
    fn deliver(&self, key: &str, outcome: Result<LoadOutcome>) {
        let waiters = self.in_flight.lock().remove(key).unwrap_or_default();
        for waiter in waiters {
            waiter(outcome.clone());
        }
    }

    fn fetch(&self, key: &str, request: &Request) -> Result<LoadOutcome> {
        let handler = self.handlers.resolve(request)?;
        let mut bitmap = handler.load(request)?;
        for transformation in request.transformations() {
            bitmap = transformation.transform(bitmap)?;
        }
        let bitmap = Arc::new(bitmap);

        if !request.memory_policy().skip_cache_write {
            self.cache.put(key, Arc::clone(&bitmap))?;
        }

        debug!(
            uri = %request.uri(),
            handler = handler.name(),
            bytes = bitmap.byte_count(),
            "Loaded bitmap"
        );
        Ok(LoadOutcome {
            key: key.to_string(),
            bitmap,
            source: Source::Handler(handler.name().to_string()),
        })
    }
}

// == In-Flight Guard ==
/// Owned by a submitted load task. Dropping it before [`finish`](Self::finish)
/// (the task was aborted, or the executor discarded it) fails the waiters, so
/// the key never stays in flight.
struct InFlightGuard {
    inner: Arc<LoaderInner>,
    key: String,
    armed: bool,
}

impl InFlightGuard {
    fn finish(mut self, outcome: Result<LoadOutcome>) {
        self.armed = false;
        self.inner.deliver(&self.key, outcome);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(key = %self.key.escape_debug(), "Load task dropped before running");
            self.inner.deliver(
                &self.key,
                Err(CacheError::Load(format!(
                    "Load of {} was cancelled",
                    self.key.trim_end_matches(KEY_SEPARATOR)
                ))),
            );
        }
    }
}
