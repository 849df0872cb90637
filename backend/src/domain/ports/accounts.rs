//! Driving ports for registration, authentication and account changes.
//!
//! Inbound adapters call these to manage accounts without knowing how users
//! are stored or how passwords are hashed.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, PasswordChange, Registration, User, UserId};

/// Account mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsCommand: Send + Sync {
    /// Register a new user in the `common` group.
    async fn signup(&self, registration: Registration) -> Result<User, Error>;

    /// Validate credentials and return the authenticated user id.
    async fn login(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;

    /// Replace the password after checking the current one.
    async fn change_password(&self, user_id: &UserId, change: PasswordChange)
    -> Result<(), Error>;

    /// Join the `authors` group; repeating the call changes nothing.
    async fn become_author(&self, user_id: &UserId) -> Result<User, Error>;
}

/// Account lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsQuery: Send + Sync {
    /// Profile of the signed-in user; `401` when the account is gone.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Whether the user belongs to `authors`; unknown users are not authors.
    async fn is_author(&self, user_id: &UserId) -> Result<bool, Error>;
}
