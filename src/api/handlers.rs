//! API Handlers
//!
//! HTTP request handlers for each inspection endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::trace;

use crate::bitmap::{Bitmap, BitmapSizer};
use crate::cache::{RemovalNotice, SharedCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::executor::{Executor, ImmediateExecutor};
use crate::loader::ImageLoader;
use crate::models::{
    ClearResponse, DeleteResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    LoadRequest, LoadResponse, ResizeRequest, ResizeResponse, SnapshotEntry, SnapshotResponse,
    StatsResponse,
};
use crate::request::{FileRequestHandler, HandlerRegistry, MemoryRequestHandler, RequestHandler};

/// Application state shared across all handlers.
///
/// Built once by the entry point and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    /// Memory cache of decoded bitmaps
    pub cache: SharedCache<Arc<Bitmap>>,
    pub loader: ImageLoader,
    /// In-process image source behind `mem://` URIs
    pub memory: Arc<MemoryRequestHandler>,
}

impl AppState {
    /// Wires a loader over `cache`. The `mem://` handler is always registered first.
    pub fn new(
        cache: SharedCache<Arc<Bitmap>>,
        extra_handlers: Vec<Arc<dyn RequestHandler>>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let memory = Arc::new(MemoryRequestHandler::new());
        let mut handlers = HandlerRegistry::new().with(memory.clone());
        for handler in extra_handlers {
            handlers.register(handler);
        }
        let loader = ImageLoader::new(cache.clone(), handlers, executor);
        Self {
            cache,
            loader,
            memory,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let cache = SharedCache::with_listener(config.max_cache_bytes, BitmapSizer, log_removal)?;

        let mut extra: Vec<Arc<dyn RequestHandler>> = Vec::new();
        if let Some(dir) = &config.asset_dir {
            extra.push(Arc::new(FileRequestHandler::new(dir)));
        }

        Ok(Self::new(cache, extra, config.executor.build()?))
    }

    /// Memory-only state with synchronous loads.
    pub fn in_memory(max_cache_bytes: usize) -> Result<Self> {
        let cache = SharedCache::with_listener(max_cache_bytes, BitmapSizer, log_removal)?;
        Ok(Self::new(cache, Vec::new(), Arc::new(ImmediateExecutor)))
    }
}

/// Removal hook for the bitmap cache. Pixel buffers are freed when the last
/// `Arc` drops, so this only records the removal.
fn log_removal(notice: &RemovalNotice<'_, Arc<Bitmap>>) {
    trace!(
        key = %notice.key.escape_debug(),
        cause = ?notice.cause,
        bytes = notice.value.byte_count(),
        "Bitmap left the memory cache"
    );
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats(), state.loader.in_flight()))
}

/// Handler for GET /snapshot
///
/// Lists entries without touching their recency.
pub async fn snapshot_handler(State(state): State<AppState>) -> Json<SnapshotResponse> {
    let (entries, size) = state
        .cache
        .with_lock(|cache| (cache.snapshot(), cache.size()));

    Json(SnapshotResponse {
        entries: entries
            .iter()
            .map(|(key, bitmap)| SnapshotEntry::new(key.as_str(), bitmap))
            .collect(),
        size,
    })
}

/// Handler for DELETE /entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let removed = state
        .cache
        .remove(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(DeleteResponse::new(key, removed.byte_count())))
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidKey(error_msg));
    }

    let removed = state.loader.invalidate(&req.prefix);
    Ok(Json(InvalidateResponse {
        prefix: req.prefix,
        removed,
    }))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.with_lock(|cache| {
        let count = cache.len();
        cache.clear();
        count
    });

    Json(ClearResponse { removed })
}

/// Handler for PUT /resize
pub async fn resize_handler(
    State(state): State<AppState>,
    Json(req): Json<ResizeRequest>,
) -> Result<Json<ResizeResponse>> {
    let (size, evicted) = state.cache.with_lock(|cache| {
        let before = cache.eviction_count();
        cache.resize(req.max_size)?;
        Ok::<_, CacheError>((cache.size(), cache.eviction_count() - before))
    })?;

    Ok(Json(ResizeResponse {
        max_size: req.max_size,
        size,
        evicted,
    }))
}

/// Handler for POST /load
pub async fn load_handler(
    State(state): State<AppState>,
    Json(req): Json<LoadRequest>,
) -> Result<Json<LoadResponse>> {
    let request = req.into_request()?;
    let outcome = state.loader.load_async(request).await?;

    Ok(Json(LoadResponse::from(outcome)))
}
