//! Domain port describing dispatch of background tasks.
use crate::domain::Task;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the queue adapter.
    pub enum TaskQueueError {
        /// The worker has shut down.
        Closed => "task queue is closed",
        /// The buffer is full; the task was not accepted.
        Full { capacity: usize } [transient] => "task queue is full (capacity {capacity})",
    }
}

/// Non-blocking task submission.
#[cfg_attr(test, mockall::automock)]
pub trait TaskQueue: Send + Sync {
    /// Hand a task to the worker without waiting for it to run.
    fn enqueue(&self, task: Task) -> Result<(), TaskQueueError>;
}
