//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Group membership lives in `user_groups`; promotion to author writes the
//! membership and the `authors` profile in one transaction.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{
    Author, AuthorId, EmailAddress, Group, PasswordHash, User, UserId, Username,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{AuthorRow, NewAuthorRow, NewUserRow, UserGroupRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{authors, user_groups, users};

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn parse_groups(user_id: Uuid, names: Vec<String>) -> BTreeSet<Group> {
    names
        .into_iter()
        .filter_map(|name| match Group::from_str(&name) {
            Ok(group) => Some(group),
            Err(err) => {
                warn!(%user_id, %err, "ignoring unknown group membership");
                None
            }
        })
        .collect()
}

fn row_to_user(row: UserRow, groups: BTreeSet<Group>) -> Result<User, UserRepositoryError> {
    let username = Username::new(&row.username)
        .map_err(|err| UserRepositoryError::query(format!("stored username invalid: {err}")))?;
    let email = EmailAddress::new(&row.email)
        .map_err(|err| UserRepositoryError::query(format!("stored email invalid: {err}")))?;
    Ok(User::new(UserId::from_uuid(row.id), username, email, row.created_at).with_groups(groups))
}

async fn load_groups(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> Result<BTreeSet<Group>, diesel::result::Error> {
    let names: Vec<String> = user_groups::table
        .filter(user_groups::user_id.eq(user_id))
        .select(user_groups::group_name)
        .load(conn)
        .await?;
    Ok(parse_groups(user_id, names))
}

async fn load_user(
    conn: &mut AsyncPgConnection,
    id: Uuid,
) -> Result<Option<User>, UserRepositoryError> {
    let row: Option<UserRow> = users::table
        .find(id)
        .select(UserRow::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
    let Some(row) = row else {
        return Ok(None);
    };
    let groups = load_groups(conn, id).await.map_err(map_diesel_error)?;
    row_to_user(row, groups).map(Some)
}

fn to_author(row: AuthorRow, username: Username) -> Author {
    Author::new(
        AuthorId::from_uuid(row.id),
        UserId::from_uuid(row.user_id),
        username,
        row.rating,
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *user.id().as_uuid();
        let row = NewUserRow {
            id,
            username: user.username().as_ref(),
            email: user.email().as_ref(),
            password_hash: password_hash.as_str(),
            created_at: user.created_at(),
        };
        let memberships: Vec<UserGroupRow<'_>> = user
            .groups()
            .iter()
            .map(|group| UserGroupRow {
                user_id: id,
                group_name: group.as_str(),
            })
            .collect();

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(user_groups::table)
                    .values(&memberships)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                UserRepositoryError::duplicate_username(user.username().as_ref())
            } else {
                map_diesel_error(err)
            }
        })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_user(&mut conn, *id.as_uuid()).await
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let groups = load_groups(&mut conn, row.id)
            .await
            .map_err(map_diesel_error)?;
        let password_hash = PasswordHash::new(row.password_hash.clone());
        let user = row_to_user(row, groups)?;
        Ok(Some(StoredCredentials {
            user,
            password_hash,
        }))
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(id.as_uuid()))
            .set(users::password_hash.eq(password_hash.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(UserRepositoryError::query(format!("user {id} not found")));
        }
        Ok(())
    }

    async fn promote_to_author(&self, id: &UserId) -> Result<Author, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_id = *id.as_uuid();

        let (author, username) = conn
            .transaction(|conn| {
                async move {
                    let username: String = users::table
                        .find(user_id)
                        .select(users::username)
                        .first(conn)
                        .await?;
                    diesel::insert_into(user_groups::table)
                        .values(&UserGroupRow {
                            user_id,
                            group_name: Group::Authors.as_str(),
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                    diesel::insert_into(authors::table)
                        .values(&NewAuthorRow {
                            id: Uuid::new_v4(),
                            user_id,
                        })
                        .on_conflict(authors::user_id)
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    let author: AuthorRow = authors::table
                        .filter(authors::user_id.eq(user_id))
                        .select(AuthorRow::as_select())
                        .first(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((author, username))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let username = Username::new(&username)
            .map_err(|err| UserRepositoryError::query(format!("stored username invalid: {err}")))?;
        Ok(to_author(author, username))
    }

    async fn find_author(&self, id: &UserId) -> Result<Option<Author>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found: Option<(AuthorRow, String)> = authors::table
            .inner_join(users::table)
            .filter(authors::user_id.eq(id.as_uuid()))
            .select((AuthorRow::as_select(), users::username))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        found
            .map(|(row, username)| {
                Username::new(&username)
                    .map(|username| to_author(row, username))
                    .map_err(|err| {
                        UserRepositoryError::query(format!("stored username invalid: {err}"))
                    })
            })
            .transpose()
    }
}
