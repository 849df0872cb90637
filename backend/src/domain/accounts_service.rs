//! Account domain services.
//!
//! Implements registration, login, password changes and author promotion on
//! top of the user repository and password hasher ports.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    AccountsCommand, AccountsQuery, PasswordHashError, PasswordHasher, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    Error, LoginCredentials, PasswordChange, PasswordHash, Registration, User, UserId,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Argon2id hash with the hasher's default cost that matches no password.
///
/// Unknown usernames are verified against it so they take as long to reject
/// as a wrong password.
pub(crate) const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$eG4YyYcjtAutAWUYa4cPGw$CmqSXEhPap8LR7/RjvwBXEuOEl7/48iNjb/SZTL2iFg";

/// Account service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountsService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, H> AccountsService<U, H> {
    pub fn new(users: Arc<U>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateUsername { username } => {
            Error::conflict("username already taken").with_details(json!({
                "field": "username",
                "value": username,
                "code": "duplicate_username",
            }))
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

impl<U, H> AccountsService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

#[async_trait]
impl<U, H> AccountsCommand for AccountsService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn signup(&self, registration: Registration) -> Result<User, Error> {
        let hash = self
            .hasher
            .hash(registration.password())
            .map_err(map_hash_error)?;
        let user = User::new(
            UserId::random(),
            registration.username().clone(),
            registration.email().clone(),
            self.clock.utc(),
        );
        self.users
            .create(&user, &hash)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %user.id(), username = %user.username(), "user registered");
        Ok(user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.username())
            .await
            .map_err(map_user_repository_error)?
        else {
            self.hasher
                .verify(credentials.password(), &PasswordHash::new(UNKNOWN_USER_HASH))
                .map_err(map_hash_error)?;
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let valid = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .map_err(map_hash_error)?;
        if !valid {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(stored.user.id().clone())
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        change: PasswordChange,
    ) -> Result<(), Error> {
        let user = self.load_user(user_id).await?;
        let stored = self
            .users
            .find_credentials(user.username().as_ref())
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        let valid = self
            .hasher
            .verify(change.current(), &stored.password_hash)
            .map_err(map_hash_error)?;
        if !valid {
            return Err(Error::forbidden("current password is incorrect"));
        }
        let hash = self
            .hasher
            .hash(change.replacement())
            .map_err(map_hash_error)?;
        self.users
            .update_password_hash(user_id, &hash)
            .await
            .map_err(map_user_repository_error)
    }

    async fn become_author(&self, user_id: &UserId) -> Result<User, Error> {
        let user = self.load_user(user_id).await?;
        if user.is_author() {
            return Ok(user);
        }
        let author = self
            .users
            .promote_to_author(user_id)
            .await
            .map_err(map_user_repository_error)?;
        info!(user_id = %user_id, author_id = %author.id(), "user joined authors");
        self.load_user(user_id).await
    }
}

#[async_trait]
impl<U, H> AccountsQuery for AccountsService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.load_user(user_id).await
    }

    async fn is_author(&self, user_id: &UserId) -> Result<bool, Error> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repository_error)?
            .is_some_and(|user| user.is_author()))
    }
}

#[cfg(test)]
#[path = "accounts_service_tests.rs"]
mod tests;
