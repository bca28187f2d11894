//! API Module
//!
//! HTTP handlers and routing for the cache inspection API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache counters and occupancy
//! - `GET /snapshot` - Cached entries, least recently used first
//! - `DELETE /entries/:key` - Remove one entry
//! - `POST /invalidate` - Remove every variant of a URI
//! - `POST /clear` - Remove everything
//! - `PUT /resize` - Change the cache bound
//! - `POST /load` - Load an image through the cache

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
