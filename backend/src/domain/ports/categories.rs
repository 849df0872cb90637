//! Driving ports for categories and subscriptions.

use async_trait::async_trait;

use crate::domain::{Category, CategoryId, CategoryTitle, Error, Post, UserId};

/// Category with its posts and the viewer's subscription state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDetail {
    pub category: Category,
    /// Newest first.
    pub posts: Vec<Post>,
    /// Always `false` for anonymous viewers.
    pub subscribed: bool,
}

/// Subscription state after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionState {
    pub category_id: CategoryId,
    pub subscribed: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoriesQuery: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, Error>;

    async fn detail(
        &self,
        id: CategoryId,
        viewer: Option<UserId>,
    ) -> Result<CategoryDetail, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoriesCommand: Send + Sync {
    /// Subscribe when not subscribed, unsubscribe otherwise.
    async fn toggle_subscription(
        &self,
        user_id: &UserId,
        id: CategoryId,
    ) -> Result<SubscriptionState, Error>;

    async fn create(&self, title: CategoryTitle) -> Result<Category, Error>;
}
