//! Category and subscription services.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::accounts_service::map_user_repository_error;
use crate::domain::posts_service::map_post_repository_error;
use crate::domain::ports::{
    CategoriesCommand, CategoriesQuery, CategoryDetail, CategoryRepository,
    CategoryRepositoryError, PostRepository, SubscriptionState, UserRepository,
};
use crate::domain::{Category, CategoryId, CategoryTitle, Error, UserId};

pub(crate) fn map_category_repository_error(error: CategoryRepositoryError) -> Error {
    match error {
        CategoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("category repository unavailable: {message}"))
        }
        CategoryRepositoryError::Query { message } => {
            Error::internal(format!("category repository error: {message}"))
        }
        CategoryRepositoryError::DuplicateTitle { title } => {
            Error::conflict("category already exists").with_details(json!({
                "field": "title",
                "value": title,
                "code": "duplicate_category",
            }))
        }
    }
}

/// Category service implementing the category driving ports.
#[derive(Clone)]
pub struct CategoriesService<C, P, U> {
    categories: Arc<C>,
    posts: Arc<P>,
    users: Arc<U>,
}

impl<C, P, U> CategoriesService<C, P, U> {
    pub fn new(categories: Arc<C>, posts: Arc<P>, users: Arc<U>) -> Self {
        Self {
            categories,
            posts,
            users,
        }
    }
}

impl<C, P, U> CategoriesService<C, P, U>
where
    C: CategoryRepository,
{
    async fn load(&self, id: CategoryId) -> Result<Category, Error> {
        self.categories
            .find_by_id(id)
            .await
            .map_err(map_category_repository_error)?
            .ok_or_else(|| Error::not_found(format!("category {id} not found")))
    }
}

#[async_trait]
impl<C, P, U> CategoriesQuery for CategoriesService<C, P, U>
where
    C: CategoryRepository,
    P: PostRepository,
    U: UserRepository,
{
    async fn list(&self) -> Result<Vec<Category>, Error> {
        self.categories
            .list()
            .await
            .map_err(map_category_repository_error)
    }

    async fn detail(
        &self,
        id: CategoryId,
        viewer: Option<UserId>,
    ) -> Result<CategoryDetail, Error> {
        let category = self.load(id).await?;
        let posts = self
            .posts
            .list_by_category(id)
            .await
            .map_err(map_post_repository_error)?;
        let subscribed = match viewer {
            Some(user_id) => self
                .categories
                .is_subscribed(id, &user_id)
                .await
                .map_err(map_category_repository_error)?,
            None => false,
        };
        Ok(CategoryDetail {
            category,
            posts,
            subscribed,
        })
    }
}

#[async_trait]
impl<C, P, U> CategoriesCommand for CategoriesService<C, P, U>
where
    C: CategoryRepository,
    P: PostRepository,
    U: UserRepository,
{
    async fn toggle_subscription(
        &self,
        user_id: &UserId,
        id: CategoryId,
    ) -> Result<SubscriptionState, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        self.load(id).await?;

        let subscribed = !self
            .categories
            .is_subscribed(id, user_id)
            .await
            .map_err(map_category_repository_error)?;
        self.categories
            .set_subscription(id, user_id, subscribed)
            .await
            .map_err(map_category_repository_error)?;
        info!(category_id = %id, user_id = %user_id, subscribed, "subscription toggled");
        Ok(SubscriptionState {
            category_id: id,
            subscribed,
        })
    }

    async fn create(&self, title: CategoryTitle) -> Result<Category, Error> {
        let category = self
            .categories
            .create(&title)
            .await
            .map_err(map_category_repository_error)?;
        info!(category_id = %category.id, title = %category.title, "category created");
        Ok(category)
    }
}
