//! Bitmap Cache - An image memory cache
//!
//! Byte-sized LRU caching of decoded bitmaps with prefix invalidation,
//! deduplicated loading through pluggable request handlers, and an HTTP
//! inspection API.

pub mod api;
pub mod bitmap;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod loader;
pub mod models;
pub mod request;

pub use api::AppState;
pub use bitmap::{Bitmap, BitmapSizer, PixelFormat};
pub use cache::{SharedCache, SizedLruCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use loader::ImageLoader;
pub use request::Request;
