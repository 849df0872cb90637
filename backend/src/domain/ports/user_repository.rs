//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Author, PasswordHash, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } [transient] => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the username.
        DuplicateUsername { username: String } => "username already taken: {username}",
    }
}

/// Stored account together with its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: PasswordHash,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with its group memberships.
    async fn create(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch a user and password hash by exact username.
    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Replace the stored password hash.
    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError>;

    /// Add the user to `authors` and ensure an author profile exists.
    ///
    /// Calling this for an existing author changes nothing and returns the
    /// existing profile.
    async fn promote_to_author(&self, id: &UserId) -> Result<Author, UserRepositoryError>;

    /// Fetch the author profile linked to a user, if any.
    async fn find_author(&self, id: &UserId) -> Result<Option<Author>, UserRepositoryError>;
}
