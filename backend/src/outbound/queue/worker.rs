//! Sequential task worker with retry policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::domain::TraceId;
use crate::domain::ports::{TaskError, TaskHandler, TaskReport};

use super::QueuedTask;

/// Retry limits for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per task, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Cap on the exponential delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay after `attempt` failed, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Async sleeping abstraction so tests can skip real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry backoff jitter abstraction.
pub trait Jitter: Send + Sync {
    fn jittered(&self, base: Duration) -> Duration;
}

/// Adds up to a quarter of the base delay at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn jittered(&self, base: Duration) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=(base_ms / 4).max(1));
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// Final state of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { report: TaskReport, attempts: u32 },
    Failed { error: TaskError, attempts: u32 },
}

/// Drains the queue and runs tasks through a [`TaskHandler`].
pub struct TaskWorker {
    handler: Arc<dyn TaskHandler>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn Jitter>,
}

impl TaskWorker {
    pub fn new(handler: Arc<dyn TaskHandler>, policy: RetryPolicy) -> Self {
        Self {
            handler,
            policy,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Replace the sleeping and jitter strategies.
    pub fn with_runtime(mut self, sleeper: Arc<dyn Sleeper>, jitter: Arc<dyn Jitter>) -> Self {
        self.sleeper = sleeper;
        self.jitter = jitter;
        self
    }

    /// Run until every queue handle is dropped.
    pub async fn run(self, mut receiver: mpsc::Receiver<QueuedTask>) {
        info!("task worker started");
        while let Some(queued) = receiver.recv().await {
            let trace_id = queued.trace_id.unwrap_or_else(TraceId::generate);
            TraceId::scope(trace_id, self.execute(queued)).await;
        }
        info!("task worker stopped");
    }

    /// Run one task to completion, retrying per policy.
    pub async fn execute(&self, queued: QueuedTask) -> TaskOutcome {
        let task = queued.task;
        let max_attempts = self.policy.max_attempts.max(1);
        let trace_id = TraceId::current().map(|id| id.to_string());

        for attempt in 1..=max_attempts {
            info!(task = %task, attempt, max_attempts, trace_id = ?trace_id, "task started");
            match self.handler.handle(&task).await {
                Ok(report) => {
                    info!(
                        task = %task,
                        attempt,
                        emails_sent = report.emails_sent,
                        "task finished"
                    );
                    return TaskOutcome::Completed {
                        report,
                        attempts: attempt,
                    };
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.jitter.jittered(self.policy.base_delay(attempt));
                    warn!(
                        task = %task,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "task attempt failed; retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(error) => {
                    error!(task = %task, attempt, %error, "task failed; dropping");
                    return TaskOutcome::Failed {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }
        // The loop always returns on its last attempt.
        TaskOutcome::Failed {
            error: TaskError::permanent("retry budget exhausted"),
            attempts: max_attempts,
        }
    }
}
