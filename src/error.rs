//! Error types for the image cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache, the loader and the HTTP surface.
///
/// Cloneable so a single failed load can be reported to every waiting caller.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Cache size bound is not positive
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Key is empty or otherwise unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Pixel buffer does not match its declared dimensions
    #[error("Invalid bitmap: {0}")]
    InvalidBitmap(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// No registered request handler claims the URI
    #[error("No request handler for: {0}")]
    Unhandled(String),

    /// A request handler or transformation failed
    #[error("Load failed: {0}")]
    Load(String),

    /// Reading an image source failed
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Arc::new(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidCapacity(_)
            | CacheError::InvalidKey(_)
            | CacheError::InvalidBitmap(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Unhandled(_) | CacheError::Load(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Io(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the image cache.
pub type Result<T> = std::result::Result<T, CacheError>;
