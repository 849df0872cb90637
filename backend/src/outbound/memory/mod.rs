//! In-memory repositories for database-less runs and integration tests.
//!
//! [`MemoryStore`] implements the user, post and category ports over a single
//! mutex-guarded state, so cross-entity invariants (a post's author rating,
//! a category's subscriber count) stay consistent without transactions.
//! Identifiers are assigned in increasing order like a database sequence.

mod categories;
mod posts;
mod users;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::domain::{
    AuthorId, CategoryId, CategoryRef, CategoryTitle, PasswordHash, Post, PostAuthor,
    PostContent, PostId, PostKind, PostTitle, User, UserId,
};

#[derive(Debug, Clone)]
struct StoredPost {
    kind: PostKind,
    author: AuthorId,
    title: PostTitle,
    content: PostContent,
    categories: Vec<CategoryId>,
    rating: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredAuthor {
    user_id: UserId,
    rating: i64,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, (User, PasswordHash)>,
    authors: HashMap<AuthorId, StoredAuthor>,
    categories: BTreeMap<CategoryId, CategoryTitle>,
    subscriptions: BTreeSet<(CategoryId, UserId)>,
    posts: BTreeMap<PostId, StoredPost>,
    next_category: i64,
    next_post: i64,
}

impl State {
    fn author_for_user(&self, user_id: &UserId) -> Option<AuthorId> {
        self.authors
            .iter()
            .find(|(_, author)| &author.user_id == user_id)
            .map(|(id, _)| *id)
    }

    fn subscriber_count(&self, id: CategoryId) -> u64 {
        let count = self
            .subscriptions
            .iter()
            .filter(|(category, _)| *category == id)
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }

    /// Materialise a stored post. Returns `None` if its author vanished.
    fn post(&self, id: PostId, stored: &StoredPost) -> Option<Post> {
        let author = self.authors.get(&stored.author)?;
        let (user, _) = self.users.get(&author.user_id)?;
        let mut categories: Vec<CategoryRef> = stored
            .categories
            .iter()
            .filter_map(|category| {
                self.categories.get(category).map(|title| CategoryRef {
                    id: *category,
                    title: title.clone(),
                })
            })
            .collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Some(Post {
            id,
            kind: stored.kind,
            author: PostAuthor {
                id: stored.author,
                username: user.username().clone(),
            },
            title: stored.title.clone(),
            content: stored.content.clone(),
            categories,
            rating: stored.rating,
            created_at: stored.created_at,
        })
    }

    /// All posts newest first.
    fn posts_desc(&self) -> impl Iterator<Item = Post> + '_ {
        self.posts
            .iter()
            .rev()
            .filter_map(|(id, stored)| self.post(*id, stored))
    }
}

/// Shared in-memory backing store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
