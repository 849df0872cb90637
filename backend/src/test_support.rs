//! Test utilities for the newspaper crate.
//!
//! Compiled for unit tests and, behind the `test-support` feature, for the
//! integration suites under `tests/`.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tokio::sync::mpsc;

use crate::domain::ports::{CategoriesCommand, TaskQueue, TaskQueueError};
use crate::domain::{
    AccountsService, CategoriesService, Category, CategoryTitle, DailyPostLimit, EmailMessage,
    Error, NotificationService, PostsService, PostsServiceDeps, SiteUrl, Task,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::mail::RecordingMailer;
use crate::outbound::memory::MemoryStore;
use crate::outbound::queue::{
    DEFAULT_QUEUE_CAPACITY, InProcessTaskQueue, QueuedTask, RetryPolicy, TaskOutcome, TaskWorker,
};
use crate::outbound::security::Argon2PasswordHasher;

/// Site URL used by [`MemoryStack::new`].
pub const TEST_SITE_URL: &str = "http://paper.test";

/// Fully wired services over the in-memory store.
///
/// Tasks enqueued by handlers stay in the channel until
/// [`MemoryStack::run_pending_tasks`] executes them, so tests decide when
/// mail goes out.
pub struct MemoryStack {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub http_state: web::Data<HttpState>,
    categories: Arc<CategoriesService<MemoryStore, MemoryStore, MemoryStore>>,
    queue: Arc<InProcessTaskQueue>,
    worker: TaskWorker,
    receiver: mpsc::Receiver<QueuedTask>,
}

impl MemoryStack {
    /// Stack with the real clock and the default daily limit.
    ///
    /// # Errors
    /// Fails only when [`TEST_SITE_URL`] cannot be parsed.
    ///
    /// # Examples
    /// ```
    /// use newspaper::test_support::MemoryStack;
    ///
    /// let stack = MemoryStack::new().expect("stack");
    /// assert!(stack.sent_mail().is_empty());
    /// ```
    pub fn new() -> Result<Self, Error> {
        Self::with_clock(Arc::new(DefaultClock), DailyPostLimit::default())
    }

    pub fn with_clock(clock: Arc<dyn Clock>, limit: DailyPostLimit) -> Result<Self, Error> {
        let site = SiteUrl::parse(TEST_SITE_URL).map_err(|err| Error::internal(err.to_string()))?;
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let (queue, receiver) = InProcessTaskQueue::channel(DEFAULT_QUEUE_CAPACITY);
        let queue = Arc::new(queue);

        let accounts = Arc::new(AccountsService::new(
            store.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            clock.clone(),
        ));
        let posts = Arc::new(PostsService::new(
            PostsServiceDeps {
                posts: store.clone(),
                categories: store.clone(),
                users: store.clone(),
                queue: queue.clone(),
                clock: clock.clone(),
            },
            limit,
        ));
        let categories = Arc::new(CategoriesService::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(
            store.clone(),
            store.clone(),
            mailer.clone(),
            clock,
            site,
        ));

        Ok(Self {
            http_state: web::Data::new(HttpState::from_services(
                accounts,
                posts,
                categories.clone(),
            )),
            store,
            mailer,
            categories,
            queue,
            worker: TaskWorker::new(notifications, RetryPolicy::default()),
            receiver,
        })
    }

    /// Create a category the way the management CLI does.
    pub async fn create_category(&self, title: &str) -> Result<Category, Error> {
        let title =
            CategoryTitle::new(title).map_err(|err| Error::invalid_request(err.to_string()))?;
        self.categories.create(title).await
    }

    /// Queue a task as the beat would.
    pub fn enqueue(&self, task: Task) -> Result<(), TaskQueueError> {
        self.queue.enqueue(task)
    }

    /// Execute every queued task in order.
    pub async fn run_pending_tasks(&mut self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(queued) = self.receiver.try_recv() {
            outcomes.push(self.worker.execute(queued).await);
        }
        outcomes
    }

    pub fn sent_mail(&self) -> Vec<EmailMessage> {
        self.mailer.sent()
    }
}
