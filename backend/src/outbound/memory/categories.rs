//! [`CategoryRepository`] over [`MemoryStore`].

use async_trait::async_trait;

use crate::domain::ports::{CategoryRepository, CategoryRepositoryError};
use crate::domain::{Category, CategoryId, CategoryTitle, Subscriber, UserId};

use super::{MemoryStore, State};

fn category(state: &State, id: CategoryId, title: &CategoryTitle) -> Category {
    Category {
        id,
        title: title.clone(),
        subscriber_count: state.subscriber_count(id),
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, title: &CategoryTitle) -> Result<Category, CategoryRepositoryError> {
        let mut state = self.lock();
        if state.categories.values().any(|existing| existing == title) {
            return Err(CategoryRepositoryError::duplicate_title(title.as_ref()));
        }
        state.next_category += 1;
        let id = CategoryId::new(state.next_category);
        state.categories.insert(id, title.clone());
        Ok(category(&state, id, title))
    }

    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError> {
        let state = self.lock();
        let mut all: Vec<Category> = state
            .categories
            .iter()
            .map(|(id, title)| category(&state, *id, title))
            .collect();
        all.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(all)
    }

    async fn find_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let state = self.lock();
        Ok(state
            .categories
            .get(&id)
            .map(|title| category(&state, id, title)))
    }

    async fn find_many(&self, ids: &[CategoryId]) -> Result<Vec<Category>, CategoryRepositoryError> {
        let state = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| state.categories.get(id).map(|title| category(&state, *id, title)))
            .collect())
    }

    async fn is_subscribed(
        &self,
        id: CategoryId,
        user: &UserId,
    ) -> Result<bool, CategoryRepositoryError> {
        Ok(self.lock().subscriptions.contains(&(id, user.clone())))
    }

    async fn set_subscription(
        &self,
        id: CategoryId,
        user: &UserId,
        subscribed: bool,
    ) -> Result<(), CategoryRepositoryError> {
        let mut state = self.lock();
        if !state.categories.contains_key(&id) {
            return Err(CategoryRepositoryError::query(format!(
                "category {id} not found"
            )));
        }
        if subscribed {
            state.subscriptions.insert((id, user.clone()));
        } else {
            state.subscriptions.remove(&(id, user.clone()));
        }
        Ok(())
    }

    async fn subscribers(
        &self,
        id: CategoryId,
    ) -> Result<Vec<Subscriber>, CategoryRepositoryError> {
        let state = self.lock();
        let mut subscribers: Vec<Subscriber> = state
            .subscriptions
            .iter()
            .filter(|(category, _)| *category == id)
            .filter_map(|(_, user_id)| state.users.get(user_id))
            .map(|(user, _)| Subscriber {
                user_id: user.id().clone(),
                username: user.username().clone(),
                email: user.email().clone(),
            })
            .collect();
        subscribers.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(subscribers)
    }
}
