//! PostgreSQL-backed `CategoryRepository` implementation using Diesel ORM.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{CategoryRepository, CategoryRepositoryError};
use crate::domain::{
    Category, CategoryId, CategoryTitle, EmailAddress, Subscriber, UserId, Username,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CategoryRow, NewCategoryRow, SubscriptionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{categories, category_subscribers, users};

/// Diesel-backed implementation of the [`CategoryRepository`] port.
#[derive(Clone)]
pub struct DieselCategoryRepository {
    pool: DbPool,
}

impl DieselCategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CategoryRepositoryError {
    map_basic_pool_error(error, CategoryRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CategoryRepositoryError {
    map_basic_diesel_error(
        error,
        CategoryRepositoryError::query,
        CategoryRepositoryError::connection,
    )
}

fn stored<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T, CategoryRepositoryError> {
    result.map_err(|err| CategoryRepositoryError::query(format!("stored category invalid: {err}")))
}

fn row_to_category(
    row: CategoryRow,
    counts: &HashMap<i64, i64>,
) -> Result<Category, CategoryRepositoryError> {
    let subscriber_count = counts
        .get(&row.id)
        .copied()
        .map_or(0, |count| u64::try_from(count).unwrap_or(0));
    Ok(Category {
        id: CategoryId::new(row.id),
        title: stored(CategoryTitle::new(&row.title))?,
        subscriber_count,
    })
}

async fn subscriber_counts(
    conn: &mut AsyncPgConnection,
    ids: &[i64],
) -> Result<HashMap<i64, i64>, CategoryRepositoryError> {
    let counts: Vec<(i64, i64)> = category_subscribers::table
        .filter(category_subscribers::category_id.eq_any(ids))
        .group_by(category_subscribers::category_id)
        .select((category_subscribers::category_id, count_star()))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(counts.into_iter().collect())
}

async fn with_counts(
    conn: &mut AsyncPgConnection,
    rows: Vec<CategoryRow>,
) -> Result<Vec<Category>, CategoryRepositoryError> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let counts = subscriber_counts(conn, &ids).await?;
    rows.into_iter()
        .map(|row| row_to_category(row, &counts))
        .collect()
}

#[async_trait]
impl CategoryRepository for DieselCategoryRepository {
    async fn create(&self, title: &CategoryTitle) -> Result<Category, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: CategoryRow = diesel::insert_into(categories::table)
            .values(&NewCategoryRow {
                title: title.as_ref(),
            })
            .returning(CategoryRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    CategoryRepositoryError::duplicate_title(title.as_ref())
                } else {
                    map_diesel_error(err)
                }
            })?;
        row_to_category(row, &HashMap::new())
    }

    async fn list(&self) -> Result<Vec<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CategoryRow> = categories::table
            .order(categories::title.asc())
            .select(CategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_counts(&mut conn, rows).await
    }

    async fn find_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CategoryRow> = categories::table
            .find(id.get())
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let rows: Vec<CategoryRow> = row.into_iter().collect();
        Ok(with_counts(&mut conn, rows).await?.into_iter().next())
    }

    async fn find_many(&self, ids: &[CategoryId]) -> Result<Vec<Category>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let rows: Vec<CategoryRow> = categories::table
            .filter(categories::id.eq_any(&raw))
            .order(categories::title.asc())
            .select(CategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_counts(&mut conn, rows).await
    }

    async fn is_subscribed(
        &self,
        id: CategoryId,
        user: &UserId,
    ) -> Result<bool, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found: i64 = category_subscribers::table
            .filter(category_subscribers::category_id.eq(id.get()))
            .filter(category_subscribers::user_id.eq(user.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(found > 0)
    }

    async fn set_subscription(
        &self,
        id: CategoryId,
        user: &UserId,
        subscribed: bool,
    ) -> Result<(), CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        if subscribed {
            diesel::insert_into(category_subscribers::table)
                .values(&SubscriptionRow {
                    category_id: id.get(),
                    user_id: *user.as_uuid(),
                })
                .on_conflict_do_nothing()
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        } else {
            diesel::delete(
                category_subscribers::table
                    .filter(category_subscribers::category_id.eq(id.get()))
                    .filter(category_subscribers::user_id.eq(user.as_uuid())),
            )
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        }
        Ok(())
    }

    async fn subscribers(
        &self,
        id: CategoryId,
    ) -> Result<Vec<Subscriber>, CategoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(Uuid, String, String)> = category_subscribers::table
            .inner_join(users::table)
            .filter(category_subscribers::category_id.eq(id.get()))
            .order(users::username.asc())
            .select((users::id, users::username, users::email))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(user_id, username, email)| {
                Ok(Subscriber {
                    user_id: UserId::from_uuid(user_id),
                    username: stored(Username::new(&username))?,
                    email: stored(EmailAddress::new(&email))?,
                })
            })
            .collect()
    }
}
