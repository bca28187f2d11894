//! Synchronous executor.

use tracing::trace;

use super::{Executor, Task, TaskHandle};

/// Runs every task to completion on the submitting thread.
///
/// For hosts that cannot run background threads, and for deterministic tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateExecutor;

impl Executor for ImmediateExecutor {
    fn submit(&self, task: Task) -> TaskHandle {
        trace!("Running task inline");
        task();
        TaskHandle::completed()
    }
}
