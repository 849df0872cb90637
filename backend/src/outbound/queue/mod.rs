//! In-process task queue and worker.
//!
//! [`InProcessTaskQueue`] implements the [`TaskQueue`] port on a bounded tokio
//! channel so request handlers never wait for delivery. A single
//! [`TaskWorker`] drains the channel, running tasks one at a time through the
//! [`TaskHandler`] port and retrying retryable failures with jittered
//! exponential backoff.
//!
//! The trace id active at enqueue time is re-entered while the task runs, so
//! job logs correlate with the request that triggered them.

mod worker;

use tokio::sync::mpsc;

use crate::domain::ports::{TaskQueue, TaskQueueError};
use crate::domain::{Task, TraceId};

pub use worker::{
    Jitter, RandomJitter, RetryPolicy, Sleeper, TaskOutcome, TaskWorker, TokioSleeper,
};

/// Default channel capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Task plus the context captured when it was enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedTask {
    pub task: Task,
    pub trace_id: Option<TraceId>,
}

/// Sending half of the in-process queue.
#[derive(Debug, Clone)]
pub struct InProcessTaskQueue {
    sender: mpsc::Sender<QueuedTask>,
    capacity: usize,
}

impl InProcessTaskQueue {
    /// Create a queue and the receiver a [`TaskWorker`] drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<QueuedTask>) {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, capacity }, receiver)
    }
}

impl TaskQueue for InProcessTaskQueue {
    fn enqueue(&self, task: Task) -> Result<(), TaskQueueError> {
        let queued = QueuedTask {
            task,
            trace_id: TraceId::current(),
        };
        self.sender.try_send(queued).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TaskQueueError::full(self.capacity),
            mpsc::error::TrySendError::Closed(_) => TaskQueueError::closed(),
        })?;
        tracing::debug!(task = %task, "task enqueued");
        Ok(())
    }
}
