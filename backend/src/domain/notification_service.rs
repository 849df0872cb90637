//! Task handler that fans out subscriber emails.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::notification::{new_post_notifications, weekly_digest};
use crate::domain::ports::{
    CategoryRepository, CategoryRepositoryError, Mailer, MailerError, PostRepository,
    PostRepositoryError, TaskError, TaskHandler, TaskReport,
};
use crate::domain::{CategoryId, EmailMessage, Post, PostId, SiteUrl, Task};

/// Length of the weekly digest window.
pub const DIGEST_WINDOW_DAYS: i64 = 7;

fn task_error(transient: bool, message: String) -> TaskError {
    if transient {
        TaskError::retryable(message)
    } else {
        TaskError::permanent(message)
    }
}

fn from_posts(error: PostRepositoryError) -> TaskError {
    task_error(error.is_transient(), error.to_string())
}

fn from_categories(error: CategoryRepositoryError) -> TaskError {
    task_error(error.is_transient(), error.to_string())
}

fn from_mailer(error: MailerError) -> TaskError {
    task_error(error.is_transient(), error.to_string())
}

/// Builds and sends new-post notifications and weekly digests.
pub struct NotificationService<P, C, M> {
    posts: Arc<P>,
    categories: Arc<C>,
    mailer: Arc<M>,
    clock: Arc<dyn Clock>,
    site: SiteUrl,
}

impl<P, C, M> NotificationService<P, C, M> {
    pub fn new(
        posts: Arc<P>,
        categories: Arc<C>,
        mailer: Arc<M>,
        clock: Arc<dyn Clock>,
        site: SiteUrl,
    ) -> Self {
        Self {
            posts,
            categories,
            mailer,
            clock,
            site,
        }
    }
}

impl<P, C, M> NotificationService<P, C, M>
where
    P: PostRepository,
    C: CategoryRepository,
    M: Mailer,
{
    async fn send(&self, messages: Vec<EmailMessage>) -> Result<TaskReport, TaskError> {
        if messages.is_empty() {
            return Ok(TaskReport::default());
        }
        let emails_sent = self
            .mailer
            .send_mass(&messages)
            .await
            .map_err(from_mailer)?;
        Ok(TaskReport { emails_sent })
    }

    /// Mail every subscriber of each of the post's categories.
    ///
    /// A post deleted before the job runs is skipped without error.
    pub async fn notify_subscribers(&self, post_id: PostId) -> Result<TaskReport, TaskError> {
        let Some(post) = self.posts.find_by_id(post_id).await.map_err(from_posts)? else {
            info!(post_id = %post_id, "post no longer exists; skipping notification");
            return Ok(TaskReport::default());
        };

        let mut messages = Vec::new();
        for category in &post.categories {
            let subscribers = self
                .categories
                .subscribers(category.id)
                .await
                .map_err(from_categories)?;
            messages.extend(new_post_notifications(
                &post,
                &category.title,
                &subscribers,
                &self.site,
            ));
        }
        debug!(post_id = %post_id, recipients = messages.len(), "notifications composed");
        self.send(messages).await
    }

    /// Mail each category's subscribers the posts created in the last week.
    pub async fn send_weekly_digest(&self) -> Result<TaskReport, TaskError> {
        let since = self.clock.utc() - Duration::days(DIGEST_WINDOW_DAYS);
        let recent = self
            .posts
            .published_since(since)
            .await
            .map_err(from_posts)?;

        let mut by_category: BTreeMap<CategoryId, Vec<Post>> = BTreeMap::new();
        for post in &recent {
            for category in &post.categories {
                by_category
                    .entry(category.id)
                    .or_default()
                    .push(post.clone());
            }
        }

        let categories = self.categories.list().await.map_err(from_categories)?;
        let mut messages = Vec::new();
        for category in categories {
            let Some(posts) = by_category.get(&category.id) else {
                continue;
            };
            let subscribers = self
                .categories
                .subscribers(category.id)
                .await
                .map_err(from_categories)?;
            messages.extend(weekly_digest(
                &category.title,
                posts,
                &subscribers,
                &self.site,
            ));
        }
        info!(
            posts = recent.len(),
            recipients = messages.len(),
            "weekly digest composed"
        );
        self.send(messages).await
    }
}

#[async_trait]
impl<P, C, M> TaskHandler for NotificationService<P, C, M>
where
    P: PostRepository,
    C: CategoryRepository,
    M: Mailer,
{
    async fn handle(&self, task: &Task) -> Result<TaskReport, TaskError> {
        match task {
            Task::NotifySubscribers { post_id } => self.notify_subscribers(*post_id).await,
            Task::WeeklyDigest => self.send_weekly_digest().await,
        }
    }
}
