//! [`UserRepository`] over [`MemoryStore`].

use async_trait::async_trait;

use crate::domain::ports::{StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{Author, AuthorId, Group, PasswordHash, User, UserId};

use super::{MemoryStore, StoredAuthor};

fn author_view(id: AuthorId, author: &StoredAuthor, user: &User) -> Author {
    Author::new(id, author.user_id.clone(), user.username().clone(), author.rating)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        if state
            .users
            .values()
            .any(|(existing, _)| existing.username() == user.username())
        {
            return Err(UserRepositoryError::duplicate_username(
                user.username().as_ref(),
            ));
        }
        state
            .users
            .insert(user.id().clone(), (user.clone(), password_hash.clone()));
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.lock().users.get(id).map(|(user, _)| user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let state = self.lock();
        Ok(state
            .users
            .values()
            .find(|(user, _)| user.username().as_ref() == username)
            .map(|(user, hash)| StoredCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        let mut state = self.lock();
        let (_, hash) = state
            .users
            .get_mut(id)
            .ok_or_else(|| UserRepositoryError::query(format!("user {id} not found")))?;
        *hash = password_hash.clone();
        Ok(())
    }

    async fn promote_to_author(&self, id: &UserId) -> Result<Author, UserRepositoryError> {
        let mut state = self.lock();
        let (user, hash) = state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| UserRepositoryError::query(format!("user {id} not found")))?;
        let groups = user.groups().iter().copied().chain([Group::Authors]);
        let promoted = user.clone().with_groups(groups);
        state.users.insert(id.clone(), (promoted.clone(), hash));

        let author_id = match state.author_for_user(id) {
            Some(existing) => existing,
            None => {
                let author_id = AuthorId::random();
                state.authors.insert(
                    author_id,
                    StoredAuthor {
                        user_id: id.clone(),
                        rating: 0,
                    },
                );
                author_id
            }
        };
        let author = state
            .authors
            .get(&author_id)
            .ok_or_else(|| UserRepositoryError::query("author profile missing"))?;
        Ok(author_view(author_id, author, &promoted))
    }

    async fn find_author(&self, id: &UserId) -> Result<Option<Author>, UserRepositoryError> {
        let state = self.lock();
        let Some(author_id) = state.author_for_user(id) else {
            return Ok(None);
        };
        let view = state
            .authors
            .get(&author_id)
            .zip(state.users.get(id))
            .map(|(author, (user, _))| author_view(author_id, author, user));
        Ok(view)
    }
}
