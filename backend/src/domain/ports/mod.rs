//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod accounts;
mod categories;
mod category_repository;
mod mailer;
mod news;
mod password_hasher;
mod post_repository;
mod task_handler;
mod task_queue;
mod user_repository;

#[cfg(test)]
pub use accounts::{MockAccountsCommand, MockAccountsQuery};
pub use accounts::{AccountsCommand, AccountsQuery};
#[cfg(test)]
pub use categories::{MockCategoriesCommand, MockCategoriesQuery};
pub use categories::{CategoriesCommand, CategoriesQuery, CategoryDetail, SubscriptionState};
#[cfg(test)]
pub use category_repository::MockCategoryRepository;
pub use category_repository::{CategoryRepository, CategoryRepositoryError};
#[cfg(test)]
pub use mailer::MockMailer;
pub use mailer::{Mailer, MailerError};
#[cfg(test)]
pub use news::{MockPostsCommand, MockPostsQuery};
pub use news::{PostPage, PostsCommand, PostsQuery};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use post_repository::MockPostRepository;
pub use post_repository::{PostRepository, PostRepositoryError};
#[cfg(test)]
pub use task_handler::MockTaskHandler;
pub use task_handler::{TaskError, TaskHandler, TaskReport};
#[cfg(test)]
pub use task_queue::MockTaskQueue;
pub use task_queue::{TaskQueue, TaskQueueError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserRepository, UserRepositoryError};
