//! Port abstraction for categories and their subscriptions.
use async_trait::async_trait;

use crate::domain::{Category, CategoryId, CategoryTitle, Subscriber, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by category repository adapters.
    pub enum CategoryRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } [transient] => "category repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "category repository query failed: {message}",
        /// Another category already uses the title.
        DuplicateTitle { title: String } => "category already exists: {title}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, title: &CategoryTitle) -> Result<Category, CategoryRepositoryError>;

    /// All categories ordered by title.
    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError>;

    async fn find_by_id(&self, id: CategoryId)
    -> Result<Option<Category>, CategoryRepositoryError>;

    /// Existing categories among `ids`; unknown ids are absent from the result.
    async fn find_many(&self, ids: &[CategoryId]) -> Result<Vec<Category>, CategoryRepositoryError>;

    async fn is_subscribed(
        &self,
        id: CategoryId,
        user: &UserId,
    ) -> Result<bool, CategoryRepositoryError>;

    /// Subscribe or unsubscribe; repeating the current state is a no-op.
    async fn set_subscription(
        &self,
        id: CategoryId,
        user: &UserId,
        subscribed: bool,
    ) -> Result<(), CategoryRepositoryError>;

    /// Subscribers of a category ordered by username.
    async fn subscribers(&self, id: CategoryId)
    -> Result<Vec<Subscriber>, CategoryRepositoryError>;
}
