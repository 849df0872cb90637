//! Driving ports for reading and publishing posts.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Error, Post, PostDraft, PostId, PostKind, RatingChange, SearchFilter, UserId};

/// One page of posts plus the total across all pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostsQuery: Send + Sync {
    /// Newest-first page; pages past the end are `404`.
    async fn list(&self, request: PageRequest) -> Result<PostPage, Error>;

    async fn detail(&self, id: PostId) -> Result<Post, Error>;

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Post>, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostsCommand: Send + Sync {
    /// Publish a post of `kind` and schedule subscriber notifications.
    async fn create(&self, user_id: &UserId, kind: PostKind, draft: PostDraft)
    -> Result<Post, Error>;

    async fn update(&self, user_id: &UserId, id: PostId, draft: PostDraft) -> Result<Post, Error>;

    async fn delete(&self, user_id: &UserId, id: PostId) -> Result<(), Error>;

    async fn rate(&self, user_id: &UserId, id: PostId, change: RatingChange)
    -> Result<Post, Error>;
}
