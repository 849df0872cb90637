//! [`PostRepository`] over [`MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{
    AuthorId, CategoryId, NewPost, Post, PostDraft, PostId, PostQuota, SearchFilter,
};

use super::{MemoryStore, State, StoredPost};

fn ensure_categories(state: &State, ids: &[CategoryId]) -> Result<(), PostRepositoryError> {
    match ids.iter().find(|id| !state.categories.contains_key(id)) {
        Some(missing) => Err(PostRepositoryError::unknown_category(missing.get())),
        None => Ok(()),
    }
}

fn materialise(state: &State, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
    match state.posts.get(&id) {
        Some(stored) => state
            .post(id, stored)
            .map(Some)
            .ok_or_else(|| PostRepositoryError::query(format!("post {id} has no author"))),
        None => Ok(None),
    }
}

fn to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn count_by_author_since(state: &State, author: AuthorId, since: DateTime<Utc>) -> u64 {
    to_u64(
        state
            .posts
            .values()
            .filter(|post| post.author == author && post.created_at > since)
            .count(),
    )
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(
        &self,
        post: &NewPost,
        quota: PostQuota,
    ) -> Result<Post, PostRepositoryError> {
        let mut state = self.lock();
        if !state.authors.contains_key(&post.author) {
            return Err(PostRepositoryError::query(format!(
                "author {} not found",
                post.author
            )));
        }
        ensure_categories(&state, &post.draft.categories)?;
        if !quota.admits(count_by_author_since(&state, post.author, quota.since)) {
            return Err(PostRepositoryError::quota_exceeded(quota.max_posts));
        }
        state.next_post += 1;
        let id = PostId::new(state.next_post);
        state.posts.insert(
            id,
            StoredPost {
                kind: post.kind,
                author: post.author,
                title: post.draft.title.clone(),
                content: post.draft.content.clone(),
                categories: post.draft.categories.clone(),
                rating: 0,
                created_at: post.created_at,
            },
        );
        materialise(&state, id)?
            .ok_or_else(|| PostRepositoryError::query("inserted post vanished"))
    }

    async fn update(
        &self,
        id: PostId,
        draft: &PostDraft,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut state = self.lock();
        ensure_categories(&state, &draft.categories)?;
        let Some(stored) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        stored.title = draft.title.clone();
        stored.content = draft.content.clone();
        stored.categories = draft.categories.clone();
        materialise(&state, id)
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostRepositoryError> {
        Ok(self.lock().posts.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        materialise(&self.lock(), id)
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Post>, PostRepositoryError> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.lock().posts_desc().skip(skip).take(take).collect())
    }

    async fn count(&self) -> Result<u64, PostRepositoryError> {
        Ok(to_u64(self.lock().posts.len()))
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(self
            .lock()
            .posts_desc()
            .filter(|post| filter.matches(post))
            .collect())
    }

    async fn list_by_category(&self, id: CategoryId) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(self
            .lock()
            .posts_desc()
            .filter(|post| post.categories.iter().any(|category| category.id == id))
            .collect())
    }

    async fn published_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        Ok(self
            .lock()
            .posts_desc()
            .filter(|post| post.created_at > since)
            .collect())
    }

    async fn adjust_rating(
        &self,
        id: PostId,
        delta: i64,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut state = self.lock();
        let Some(stored) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        stored.rating += delta;
        let author = stored.author;
        if let Some(profile) = state.authors.get_mut(&author) {
            profile.rating += delta;
        }
        materialise(&state, id)
    }
}
