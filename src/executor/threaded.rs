//! Tokio-backed executor.

use tokio::runtime::Handle;
use tracing::trace;

use super::{Executor, Task, TaskHandle};
use crate::error::{CacheError, Result};

/// Runs tasks on the tokio blocking thread pool.
///
/// Image loads do file I/O and pixel work, so they go to `spawn_blocking`
/// rather than the async worker threads.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Binds to the runtime the caller is running on.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| CacheError::Internal(format!("No tokio runtime: {}", e)))
    }
}

impl Executor for TokioExecutor {
    fn submit(&self, task: Task) -> TaskHandle {
        trace!("Submitting task to blocking pool");
        TaskHandle::spawned(self.handle.spawn_blocking(task))
    }
}
