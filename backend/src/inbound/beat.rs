//! Cron-driven scheduler that enqueues periodic tasks.
//!
//! The beat never runs jobs itself; it only hands them to the [`TaskQueue`]
//! at each fire time so the worker's retry policy applies to them as well.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::Task;
use crate::domain::ports::TaskQueue;
use crate::outbound::queue::{Sleeper, TokioSleeper};

/// Mondays at 08:00 UTC.
pub const DEFAULT_DIGEST_CRON: &str = "0 0 8 * * Mon";

/// Cron expression that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cron expression {expression:?}: {message}")]
pub struct ScheduleError {
    pub expression: String,
    pub message: String,
}

/// Parse a six-field (`sec min hour dom month dow`) cron expression.
///
/// # Examples
/// ```
/// use newspaper::inbound::beat::{DEFAULT_DIGEST_CRON, parse_schedule};
///
/// assert!(parse_schedule(DEFAULT_DIGEST_CRON).is_ok());
/// assert!(parse_schedule("every monday").is_err());
/// ```
pub fn parse_schedule(expression: &str) -> Result<Schedule, ScheduleError> {
    Schedule::from_str(expression.trim()).map_err(|err| ScheduleError {
        expression: expression.to_owned(),
        message: err.to_string(),
    })
}

/// One task and the schedule it fires on.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    pub task: Task,
    pub schedule: Schedule,
}

impl PeriodicTask {
    /// The weekly digest on `schedule`.
    pub fn weekly_digest(schedule: Schedule) -> Self {
        Self {
            task: Task::WeeklyDigest,
            schedule,
        }
    }
}

/// Sleeps until the next fire time, then enqueues the task.
pub struct Beat {
    entries: Vec<PeriodicTask>,
    queue: Arc<dyn TaskQueue>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    last_fired: Option<DateTime<Utc>>,
}

impl Beat {
    pub fn new(entries: Vec<PeriodicTask>, queue: Arc<dyn TaskQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries,
            queue,
            clock,
            sleeper: Arc::new(TokioSleeper),
            last_fired: None,
        }
    }

    /// Replace the sleeping strategy.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Earliest upcoming fire time strictly after `now` and the tasks due then.
    ///
    /// Never returns a time at or before the last fire, so a clock that lags
    /// the sleeper cannot fire the same slot twice.
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<Task>)> {
        let after = self.last_fired.map_or(now, |last| last.max(now));
        let upcoming: Vec<(DateTime<Utc>, Task)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .schedule
                    .after(&after)
                    .next()
                    .map(|fire_at| (fire_at, entry.task))
            })
            .collect();
        let fire_at = upcoming.iter().map(|(at, _)| *at).min()?;
        let tasks = upcoming
            .into_iter()
            .filter(|(at, _)| *at == fire_at)
            .map(|(_, task)| task)
            .collect();
        Some((fire_at, tasks))
    }

    /// Wait for the next fire time and enqueue whatever is due.
    ///
    /// Returns the fire time, or `None` when no entry has an upcoming slot.
    pub async fn tick(&mut self) -> Option<DateTime<Utc>> {
        let now = self.clock.utc();
        let (fire_at, tasks) = self.next_due(now)?;
        let wait = (fire_at - now).to_std().unwrap_or_default();
        info!(
            fire_at = %fire_at,
            wait_secs = wait.as_secs(),
            "beat sleeping until next slot"
        );
        self.sleeper.sleep(wait).await;

        for task in tasks {
            match self.queue.enqueue(task) {
                Ok(()) => info!(task = %task, "periodic task enqueued"),
                Err(error) => warn!(task = %task, %error, "periodic task not enqueued"),
            }
        }
        self.last_fired = Some(fire_at);
        Some(fire_at)
    }

    /// Tick forever; returns early only when nothing is scheduled.
    pub async fn run(mut self) {
        info!(entries = self.entries.len(), "beat started");
        while self.tick().await.is_some() {}
        warn!("beat stopped: no upcoming slots");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::PostId;
    use crate::domain::ports::{MockTaskQueue, TaskQueueError};
    use crate::domain::test_fixtures::{FixedClock, timestamp};

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().expect("sleeper mutex").push(duration);
        }
    }

    fn digest_beat(queue: MockTaskQueue, now: DateTime<Utc>) -> (Beat, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let schedule = parse_schedule(DEFAULT_DIGEST_CRON).expect("default schedule");
        let beat = Beat::new(
            vec![PeriodicTask::weekly_digest(schedule)],
            Arc::new(queue),
            Arc::new(FixedClock(now)),
        )
        .with_sleeper(sleeper.clone());
        (beat, sleeper)
    }

    #[rstest]
    #[case::saturday(timestamp(2024, 6, 1, 10), timestamp(2024, 6, 3, 8))]
    #[case::monday_early(timestamp(2024, 6, 3, 7), timestamp(2024, 6, 3, 8))]
    #[case::monday_on_the_hour(timestamp(2024, 6, 3, 8), timestamp(2024, 6, 10, 8))]
    fn default_schedule_fires_monday_morning(
        #[case] now: DateTime<Utc>,
        #[case] expected: DateTime<Utc>,
    ) {
        let (beat, _) = digest_beat(MockTaskQueue::new(), now);

        let (fire_at, tasks) = beat.next_due(now).expect("slot scheduled");

        assert_eq!(fire_at, expected);
        assert_eq!(tasks, vec![Task::WeeklyDigest]);
    }

    #[rstest]
    #[case("")]
    #[case("0 0 8 * * Funday")]
    #[case("tomorrow")]
    fn malformed_expressions_are_rejected(#[case] expression: &str) {
        let err = parse_schedule(expression).expect_err("invalid cron");
        assert_eq!(err.expression, expression);
    }

    #[tokio::test]
    async fn tick_sleeps_until_the_slot_then_enqueues() {
        let mut queue = MockTaskQueue::new();
        queue
            .expect_enqueue()
            .withf(|task| *task == Task::WeeklyDigest)
            .times(1)
            .returning(|_| Ok(()));
        let (mut beat, sleeper) = digest_beat(queue, timestamp(2024, 6, 3, 7));

        let fired = beat.tick().await;

        assert_eq!(fired, Some(timestamp(2024, 6, 3, 8)));
        assert_eq!(
            *sleeper.0.lock().expect("sleeper mutex"),
            vec![Duration::from_secs(3600)]
        );
    }

    #[tokio::test]
    async fn a_lagging_clock_does_not_refire_the_same_slot() {
        let mut queue = MockTaskQueue::new();
        queue.expect_enqueue().times(2).returning(|_| Ok(()));
        let (mut beat, _) = digest_beat(queue, timestamp(2024, 6, 3, 7));

        let first = beat.tick().await;
        let second = beat.tick().await;

        assert_eq!(first, Some(timestamp(2024, 6, 3, 8)));
        assert_eq!(second, Some(timestamp(2024, 6, 10, 8)));
    }

    #[tokio::test]
    async fn a_full_queue_does_not_stop_the_beat() {
        let mut queue = MockTaskQueue::new();
        queue
            .expect_enqueue()
            .returning(|_| Err(TaskQueueError::full(1_usize)));
        let (mut beat, _) = digest_beat(queue, timestamp(2024, 6, 3, 7));

        assert!(beat.tick().await.is_some());
    }

    #[rstest]
    fn simultaneous_entries_fire_together() {
        let every_minute = parse_schedule("0 * * * * *").expect("schedule");
        let notify = Task::NotifySubscribers {
            post_id: PostId::new(1),
        };
        let now = timestamp(2024, 6, 3, 7);
        let beat = Beat::new(
            vec![
                PeriodicTask::weekly_digest(every_minute.clone()),
                PeriodicTask {
                    task: notify,
                    schedule: every_minute,
                },
            ],
            Arc::new(MockTaskQueue::new()),
            Arc::new(FixedClock(now)),
        );

        let (_, tasks) = beat.next_due(now).expect("slot scheduled");

        assert_eq!(tasks, vec![Task::WeeklyDigest, notify]);
    }
}
