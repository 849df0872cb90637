//! Post domain services.
//!
//! Publishing checks group permissions and the daily post limit, persists the
//! post, then hands subscriber notification to the task queue.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::PageRequest;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::accounts_service::map_user_repository_error;
use crate::domain::categories_service::map_category_repository_error;
use crate::domain::ports::{
    CategoryRepository, PostPage, PostRepository, PostRepositoryError, PostsCommand, PostsQuery,
    TaskQueue, UserRepository,
};
use crate::domain::{
    Author, CategoryId, DailyPostLimit, Error, NewPost, Permission, Post, PostDraft, PostId,
    PostKind, RatingChange, SearchFilter, Task, User, UserId,
};

pub(crate) fn map_post_repository_error(error: PostRepositoryError) -> Error {
    match error {
        PostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        PostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
        PostRepositoryError::UnknownCategory { id } => unknown_categories(&[CategoryId::new(id)]),
        PostRepositoryError::QuotaExceeded { max_posts } => {
            DailyPostLimit::new(max_posts).rejection()
        }
    }
}

fn unknown_categories(ids: &[CategoryId]) -> Error {
    let ids: Vec<i64> = ids.iter().map(|id| id.get()).collect();
    Error::invalid_request("unknown category").with_details(json!({
        "field": "categories",
        "unknownIds": ids,
        "code": "unknown_category",
    }))
}

fn post_not_found(id: PostId) -> Error {
    Error::not_found(format!("post {id} not found"))
}

/// Collaborators of [`PostsService`].
pub struct PostsServiceDeps<P, C, U> {
    pub posts: Arc<P>,
    pub categories: Arc<C>,
    pub users: Arc<U>,
    pub queue: Arc<dyn TaskQueue>,
    pub clock: Arc<dyn Clock>,
}

/// Post service implementing the news driving ports.
pub struct PostsService<P, C, U> {
    posts: Arc<P>,
    categories: Arc<C>,
    users: Arc<U>,
    queue: Arc<dyn TaskQueue>,
    clock: Arc<dyn Clock>,
    limit: DailyPostLimit,
}

impl<P, C, U> PostsService<P, C, U> {
    pub fn new(deps: PostsServiceDeps<P, C, U>, limit: DailyPostLimit) -> Self {
        let PostsServiceDeps {
            posts,
            categories,
            users,
            queue,
            clock,
        } = deps;
        Self {
            posts,
            categories,
            users,
            queue,
            clock,
            limit,
        }
    }
}

impl<P, C, U> PostsService<P, C, U>
where
    P: PostRepository,
    C: CategoryRepository,
    U: UserRepository,
{
    async fn authorise(&self, user_id: &UserId, permission: Permission) -> Result<User, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        if !user.has_permission(permission) {
            return Err(Error::forbidden(format!("permission denied: {permission}")));
        }
        Ok(user)
    }

    async fn ensure_categories_exist(&self, ids: &[CategoryId]) -> Result<(), Error> {
        let found = self
            .categories
            .find_many(ids)
            .await
            .map_err(map_category_repository_error)?;
        let missing: Vec<CategoryId> = ids
            .iter()
            .copied()
            .filter(|id| !found.iter().any(|category| category.id == *id))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(unknown_categories(&missing))
        }
    }

    async fn author_profile(&self, user: &User) -> Result<Author, Error> {
        if let Some(author) = self
            .users
            .find_author(user.id())
            .await
            .map_err(map_user_repository_error)?
        {
            return Ok(author);
        }
        self.users
            .promote_to_author(user.id())
            .await
            .map_err(map_user_repository_error)
    }
}

#[async_trait]
impl<P, C, U> PostsQuery for PostsService<P, C, U>
where
    P: PostRepository,
    C: CategoryRepository,
    U: UserRepository,
{
    async fn list(&self, request: PageRequest) -> Result<PostPage, Error> {
        let total = self.posts.count().await.map_err(map_post_repository_error)?;
        request
            .ensure_in_range(total)
            .map_err(|err| Error::not_found(err.to_string()))?;
        let posts = self
            .posts
            .list(request.offset(), request.limit())
            .await
            .map_err(map_post_repository_error)?;
        Ok(PostPage { posts, total })
    }

    async fn detail(&self, id: PostId) -> Result<Post, Error> {
        self.posts
            .find_by_id(id)
            .await
            .map_err(map_post_repository_error)?
            .ok_or_else(|| post_not_found(id))
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Post>, Error> {
        self.posts
            .search(filter)
            .await
            .map_err(map_post_repository_error)
    }
}

#[async_trait]
impl<P, C, U> PostsCommand for PostsService<P, C, U>
where
    P: PostRepository,
    C: CategoryRepository,
    U: UserRepository,
{
    async fn create(
        &self,
        user_id: &UserId,
        kind: PostKind,
        draft: PostDraft,
    ) -> Result<Post, Error> {
        let user = self.authorise(user_id, Permission::AddPost).await?;
        self.ensure_categories_exist(&draft.categories).await?;
        let author = self.author_profile(&user).await?;

        let now = self.clock.utc();
        let new_post = NewPost {
            author: author.id(),
            kind,
            draft,
            created_at: now,
        };
        let post = self
            .posts
            .create(&new_post, self.limit.quota(now))
            .await
            .map_err(map_post_repository_error)?;
        info!(post_id = %post.id, kind = %kind, author = %author.username(), "post published");

        let task = Task::NotifySubscribers { post_id: post.id };
        if let Err(error) = self.queue.enqueue(task) {
            warn!(post_id = %post.id, %error, "failed to enqueue subscriber notification");
        }
        Ok(post)
    }

    async fn update(&self, user_id: &UserId, id: PostId, draft: PostDraft) -> Result<Post, Error> {
        self.authorise(user_id, Permission::ChangePost).await?;
        self.ensure_categories_exist(&draft.categories).await?;
        let updated = self
            .posts
            .update(id, &draft)
            .await
            .map_err(map_post_repository_error)?
            .ok_or_else(|| post_not_found(id))?;
        info!(post_id = %id, "post updated");
        Ok(updated)
    }

    async fn delete(&self, user_id: &UserId, id: PostId) -> Result<(), Error> {
        self.authorise(user_id, Permission::DeletePost).await?;
        let deleted = self
            .posts
            .delete(id)
            .await
            .map_err(map_post_repository_error)?;
        if !deleted {
            return Err(post_not_found(id));
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    async fn rate(
        &self,
        user_id: &UserId,
        id: PostId,
        change: RatingChange,
    ) -> Result<Post, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        self.posts
            .adjust_rating(id, change.delta())
            .await
            .map_err(map_post_repository_error)?
            .ok_or_else(|| post_not_found(id))
    }
}

#[cfg(test)]
#[path = "posts_service_tests.rs"]
mod tests;
