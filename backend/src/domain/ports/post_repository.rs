//! Port abstraction for post persistence.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CategoryId, NewPost, Post, PostDraft, PostId, PostQuota, SearchFilter};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by post repository adapters.
    pub enum PostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } [transient] => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
        /// A referenced category does not exist.
        UnknownCategory { id: i64 } => "unknown category: {id}",
        /// The author already has `max_posts` posts inside the quota window.
        QuotaExceeded { max_posts: u32 } => "post quota of {max_posts} exhausted",
    }
}

/// Read and write access to posts.
///
/// Every list returned by this port is ordered by descending post id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post and its category links atomically.
    ///
    /// Counting the author's posts since `quota.since` and inserting happen
    /// under one per-author lock, so concurrent creates cannot both pass a
    /// nearly full quota.
    async fn create(&self, post: &NewPost, quota: PostQuota)
    -> Result<Post, PostRepositoryError>;

    /// Replace title, content and categories. `None` when the post is missing.
    async fn update(
        &self,
        id: PostId,
        draft: &PostDraft,
    ) -> Result<Option<Post>, PostRepositoryError>;

    /// Delete a post. Returns `false` when nothing was deleted.
    async fn delete(&self, id: PostId) -> Result<bool, PostRepositoryError>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError>;

    /// One window of the full post list.
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Post>, PostRepositoryError>;

    async fn count(&self) -> Result<u64, PostRepositoryError>;

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Post>, PostRepositoryError>;

    async fn list_by_category(&self, id: CategoryId) -> Result<Vec<Post>, PostRepositoryError>;

    /// Posts created strictly after `since`.
    async fn published_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostRepositoryError>;

    /// Add `delta` to the post rating and to its author's rating.
    async fn adjust_rating(
        &self,
        id: PostId,
        delta: i64,
    ) -> Result<Option<Post>, PostRepositoryError>;
}
