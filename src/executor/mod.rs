//! Executor Module
//!
//! Task submission abstraction used by the image loader.
//!
//! # Executors
//! - [`TokioExecutor`]: runs tasks on the tokio blocking pool
//! - [`ImmediateExecutor`]: runs tasks on the submitting thread before returning

mod immediate;
mod threaded;

use std::str::FromStr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{CacheError, Result};

pub use immediate::ImmediateExecutor;
pub use threaded::TokioExecutor;

/// A unit of work handed to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

// == Executor ==
/// Runs submitted tasks somewhere and hands back a handle to them.
pub trait Executor: Send + Sync {
    fn submit(&self, task: Task) -> TaskHandle;
}

// == Task Handle ==
/// Handle to a submitted task.
///
/// Tasks that already ran to completion (for example on an
/// [`ImmediateExecutor`]) carry no join handle.
#[derive(Debug)]
pub struct TaskHandle {
    inner: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Handle for a task that has already finished.
    pub fn completed() -> Self {
        Self { inner: None }
    }

    /// Handle for a task running on the tokio runtime.
    pub fn spawned(handle: JoinHandle<()>) -> Self {
        Self {
            inner: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Requests cancellation. Tasks already running keep running to completion.
    pub fn abort(&self) {
        if let Some(handle) = &self.inner {
            handle.abort();
        }
    }

    /// Waits for the task to finish.
    pub async fn join(self) -> Result<()> {
        match self.inner {
            None => Ok(()),
            Some(handle) => handle
                .await
                .map_err(|e| CacheError::Internal(format!("Task failed: {}", e))),
        }
    }
}

// == Executor Kind ==
/// Executor selection, as read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorKind {
    /// Multi-threaded execution on the tokio runtime
    #[default]
    Threaded,
    /// Synchronous execution on the caller's thread
    Immediate,
}

impl FromStr for ExecutorKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threaded" => Ok(ExecutorKind::Threaded),
            "immediate" => Ok(ExecutorKind::Immediate),
            other => Err(CacheError::Internal(format!("Unknown executor kind: {}", other))),
        }
    }
}

impl ExecutorKind {
    /// Builds the selected executor. `Threaded` needs a running tokio runtime.
    pub fn build(self) -> Result<Arc<dyn Executor>> {
        Ok(match self {
            ExecutorKind::Threaded => Arc::new(TokioExecutor::current()?),
            ExecutorKind::Immediate => Arc::new(ImmediateExecutor),
        })
    }
}
