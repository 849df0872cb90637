//! Driving port invoked by the task worker for each job.
use async_trait::async_trait;

use crate::domain::Task;

use super::define_port_error;

define_port_error! {
    /// Failure of a single task attempt.
    pub enum TaskError {
        /// A later attempt may succeed.
        Retryable { message: String } [transient] => "task failed, will retry: {message}",
        /// Retrying cannot help.
        Permanent { message: String } => "task failed permanently: {message}",
    }
}

/// Summary of a completed task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub emails_sent: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> Result<TaskReport, TaskError>;
}
