//! PostgreSQL-backed `PostRepository` implementation using Diesel ORM.
//!
//! Posts are read joined with their author's username; category links are
//! fetched in a second query for the whole batch and ordered by title.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{PostRepository, PostRepositoryError};
use crate::domain::{
    AuthorId, CategoryId, CategoryRef, CategoryTitle, NewPost, Post, PostAuthor, PostContent,
    PostDraft, PostId, PostKind, PostQuota, PostTitle, SearchFilter, Username,
};

use super::diesel_basic_error_mapping::{
    like_pattern, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{CategoryRow, NewPostRow, PostCategoryRow, PostRow, PostUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{authors, categories, post_categories, posts, users};

/// Posts joined with the author username, newest first.
macro_rules! post_rows {
    () => {
        posts::table
            .inner_join(authors::table.inner_join(users::table))
            .select((PostRow::as_select(), users::username))
            .order(posts::id.desc())
    };
}

/// Diesel-backed implementation of the [`PostRepository`] port.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a write transaction.
enum WriteError {
    Diesel(diesel::result::Error),
    UnknownCategory(i64),
    QuotaExceeded(u32),
}

impl From<diesel::result::Error> for WriteError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> PostRepositoryError {
    map_basic_pool_error(error, PostRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PostRepositoryError {
    map_basic_diesel_error(
        error,
        PostRepositoryError::query,
        PostRepositoryError::connection,
    )
}

fn map_write_error(error: WriteError) -> PostRepositoryError {
    match error {
        WriteError::Diesel(error) => map_diesel_error(error),
        WriteError::UnknownCategory(id) => PostRepositoryError::unknown_category(id),
        WriteError::QuotaExceeded(max_posts) => PostRepositoryError::quota_exceeded(max_posts),
    }
}

fn stored<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T, PostRepositoryError> {
    result.map_err(|err| PostRepositoryError::query(format!("stored post invalid: {err}")))
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_sql_window(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn row_to_post(
    row: PostRow,
    username: &str,
    categories: Vec<CategoryRef>,
) -> Result<Post, PostRepositoryError> {
    Ok(Post {
        id: PostId::new(row.id),
        kind: stored(PostKind::from_str(&row.kind))?,
        author: PostAuthor {
            id: AuthorId::from_uuid(row.author_id),
            username: stored(Username::new(username))?,
        },
        title: stored(PostTitle::new(&row.title))?,
        content: stored(PostContent::new(row.content))?,
        categories,
        rating: row.rating,
        created_at: row.created_at,
    })
}

/// Attach category links to a batch of post rows, preserving row order.
async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<(PostRow, String)>,
) -> Result<Vec<Post>, PostRepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|(row, _)| row.id).collect();
    let links: Vec<(i64, CategoryRow)> = post_categories::table
        .inner_join(categories::table)
        .filter(post_categories::post_id.eq_any(&ids))
        .select((post_categories::post_id, CategoryRow::as_select()))
        .order(categories::title.asc())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut by_post: HashMap<i64, Vec<CategoryRef>> = HashMap::new();
    for (post_id, category) in links {
        let title = stored(CategoryTitle::new(&category.title))?;
        by_post.entry(post_id).or_default().push(CategoryRef {
            id: CategoryId::new(category.id),
            title,
        });
    }

    rows.into_iter()
        .map(|(row, username)| {
            let categories = by_post.remove(&row.id).unwrap_or_default();
            row_to_post(row, &username, categories)
        })
        .collect()
}

async fn load_post(
    conn: &mut AsyncPgConnection,
    id: i64,
) -> Result<Option<Post>, PostRepositoryError> {
    let rows: Vec<(PostRow, String)> = post_rows!()
        .filter(posts::id.eq(id))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(hydrate(conn, rows).await?.into_iter().next())
}

async fn ensure_categories(
    conn: &mut AsyncPgConnection,
    ids: &[i64],
) -> Result<(), WriteError> {
    let existing: Vec<i64> = categories::table
        .filter(categories::id.eq_any(ids))
        .select(categories::id)
        .load(conn)
        .await?;
    match ids.iter().find(|id| !existing.contains(id)) {
        Some(missing) => Err(WriteError::UnknownCategory(*missing)),
        None => Ok(()),
    }
}

async fn link_categories(
    conn: &mut AsyncPgConnection,
    post_id: i64,
    ids: &[i64],
) -> Result<(), WriteError> {
    let links: Vec<PostCategoryRow> = ids
        .iter()
        .map(|category_id| PostCategoryRow {
            post_id,
            category_id: *category_id,
        })
        .collect();
    diesel::insert_into(post_categories::table)
        .values(&links)
        .execute(conn)
        .await?;
    Ok(())
}

/// Lock the author row, then count their posts inside the quota window.
///
/// The lock lasts until the surrounding transaction ends, so a second create
/// by the same author waits and then sees this one's insert.
async fn claim_quota(
    conn: &mut AsyncPgConnection,
    author: Uuid,
    quota: PostQuota,
) -> Result<(), WriteError> {
    authors::table
        .find(author)
        .select(authors::id)
        .for_update()
        .get_result::<Uuid>(conn)
        .await?;
    let recent: i64 = posts::table
        .filter(posts::author_id.eq(author))
        .filter(posts::created_at.gt(quota.since))
        .count()
        .get_result(conn)
        .await?;
    if quota.admits(to_count(recent)) {
        Ok(())
    } else {
        Err(WriteError::QuotaExceeded(quota.max_posts))
    }
}

fn category_ids(draft: &PostDraft) -> Vec<i64> {
    draft.categories.iter().map(|id| id.get()).collect()
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn create(
        &self,
        post: &NewPost,
        quota: PostQuota,
    ) -> Result<Post, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids = category_ids(&post.draft);
        let author = *post.author.as_uuid();
        let row = NewPostRow {
            author_id: *post.author.as_uuid(),
            kind: post.kind.as_str(),
            title: post.draft.title.as_ref(),
            content: post.draft.content.as_ref(),
            created_at: post.created_at,
        };

        let id = conn
            .transaction(|conn| {
                async move {
                    ensure_categories(conn, &ids).await?;
                    claim_quota(conn, author, quota).await?;
                    let id: i64 = diesel::insert_into(posts::table)
                        .values(&row)
                        .returning(posts::id)
                        .get_result(conn)
                        .await?;
                    link_categories(conn, id, &ids).await?;
                    Ok::<_, WriteError>(id)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_write_error)?;

        load_post(&mut conn, id)
            .await?
            .ok_or_else(|| PostRepositoryError::query("inserted post vanished"))
    }

    async fn update(
        &self,
        id: PostId,
        draft: &PostDraft,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids = category_ids(draft);
        let changes = PostUpdate {
            title: draft.title.as_ref(),
            content: draft.content.as_ref(),
        };
        let post_id = id.get();

        let found = conn
            .transaction(|conn| {
                async move {
                    ensure_categories(conn, &ids).await?;
                    let updated = diesel::update(posts::table.find(post_id))
                        .set(&changes)
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Ok(false);
                    }
                    diesel::delete(
                        post_categories::table.filter(post_categories::post_id.eq(post_id)),
                    )
                    .execute(conn)
                    .await?;
                    link_categories(conn, post_id, &ids).await?;
                    Ok::<_, WriteError>(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_write_error)?;

        if !found {
            return Ok(None);
        }
        load_post(&mut conn, post_id).await
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(posts::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_post(&mut conn, id.get()).await
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(PostRow, String)> = post_rows!()
            .offset(to_sql_window(offset))
            .limit(to_sql_window(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn count(&self) -> Result<u64, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = posts::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(total))
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = post_rows!().into_boxed();
        if let Some(title) = filter.title() {
            query = query.filter(posts::title.ilike(like_pattern(title)));
        }
        if let Some(author) = filter.author_name() {
            query = query.filter(users::username.ilike(like_pattern(author)));
        }
        if let Some(after) = filter.created_after() {
            query = query.filter(posts::created_at.gt(after));
        }
        let rows: Vec<(PostRow, String)> = query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn list_by_category(&self, id: CategoryId) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let linked = post_categories::table
            .filter(post_categories::category_id.eq(id.get()))
            .select(post_categories::post_id);
        let rows: Vec<(PostRow, String)> = post_rows!()
            .filter(posts::id.eq_any(linked))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn published_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(PostRow, String)> = post_rows!()
            .filter(posts::created_at.gt(since))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn adjust_rating(
        &self,
        id: PostId,
        delta: i64,
    ) -> Result<Option<Post>, PostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_id = id.get();

        let author = conn
            .transaction(|conn| {
                async move {
                    let author: Option<Uuid> = diesel::update(posts::table.find(post_id))
                        .set(posts::rating.eq(posts::rating + delta))
                        .returning(posts::author_id)
                        .get_result(conn)
                        .await
                        .optional()?;
                    if let Some(author) = author {
                        diesel::update(authors::table.find(author))
                            .set(authors::rating.eq(authors::rating + delta))
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, diesel::result::Error>(author)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if author.is_none() {
            return Ok(None);
        }
        load_post(&mut conn, post_id).await
    }
}
