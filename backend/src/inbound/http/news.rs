//! Post API handlers.
//!
//! ```text
//! GET /api/v1/news?page=2
//! GET /api/v1/news/search?title=mars&authorName=ann&dateAfter=2024-06-01
//! GET /api/v1/news/{id}
//! POST /api/v1/news {"title":"...","content":"...","categories":[1]}
//! POST /api/v1/articles {"title":"...","content":"...","categories":[1,2]}
//! PUT /api/v1/news/{id}
//! DELETE /api/v1/news/{id}
//! POST /api/v1/news/{id}/like
//! POST /api/v1/news/{id}/dislike
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use pagination::Page;

use crate::domain::{
    Error, PostDraft, PostId, PostKind, RatingChange, SearchFilter, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::news_dto::{
    NewsPageResponse, PageQuery, PostDraftRequest, PostResponse, PostSummary, SearchQuery,
};
use crate::inbound::http::session::Visitor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_post_validation_error, parse_page};

async fn viewer_is_author(state: &HttpState, viewer: Option<UserId>) -> ApiResult<bool> {
    match viewer {
        Some(user_id) => state.accounts_query.is_author(&user_id).await,
        None => Ok(false),
    }
}

fn parse_draft(payload: PostDraftRequest) -> ApiResult<PostDraft> {
    PostDraft::try_from(payload).map_err(map_post_validation_error)
}

/// Newest-first list of posts, ten per page.
#[utoipa::path(
    get,
    path = "/api/v1/news",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of posts", body = NewsPageResponse),
        (status = 404, description = "Page out of range", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["news"],
    operation_id = "listNews",
    security([])
)]
#[get("/news")]
pub async fn list_news(
    state: web::Data<HttpState>,
    visitor: Visitor,
    query: web::Query<PageQuery>,
    request: HttpRequest,
) -> ApiResult<web::Json<NewsPageResponse>> {
    let page_request = parse_page(query.page.as_deref())?;
    let page = state.posts_query.list(page_request).await?;
    let is_author = viewer_is_author(&state, visitor.signed_in()?).await?;

    let items = page.posts.iter().map(PostSummary::from).collect();
    let page = Page::new(items, page_request, page.total, &request.full_url());
    Ok(web::Json(NewsPageResponse::new(page, is_author)))
}

/// Filter posts by title, author and creation date.
#[utoipa::path(
    get,
    path = "/api/v1/news/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching posts, newest first", body = [PostSummary]),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["news"],
    operation_id = "searchNews",
    security([])
)]
#[get("/news/search")]
pub async fn search_news(
    state: web::Data<HttpState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<PostSummary>>> {
    let filter = SearchFilter::try_from_parts(
        query.title.as_deref(),
        query.author_name.as_deref(),
        query.date_after.as_deref(),
    )
    .map_err(map_post_validation_error)?;
    let posts = state.posts_query.search(&filter).await?;
    Ok(web::Json(posts.iter().map(PostSummary::from).collect()))
}

/// One post with its full content.
#[utoipa::path(
    get,
    path = "/api/v1/news/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["news"],
    operation_id = "getNews",
    security([])
)]
#[get("/news/{id}")]
pub async fn news_detail(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PostResponse>> {
    let post = state.posts_query.detail(PostId::new(path.into_inner())).await?;
    Ok(web::Json(PostResponse::from(&post)))
}

async fn create(
    state: &HttpState,
    visitor: &Visitor,
    kind: PostKind,
    payload: PostDraftRequest,
) -> ApiResult<HttpResponse> {
    let user_id = visitor.require_signed_in()?;
    let draft = parse_draft(payload)?;
    let post = state.posts.create(&user_id, kind, draft).await?;
    Ok(HttpResponse::Created()
        .insert_header((actix_web::http::header::LOCATION, post.absolute_path()))
        .json(PostResponse::from(&post)))
}

/// Publish a news item.
#[utoipa::path(
    post,
    path = "/api/v1/news",
    request_body = PostDraftRequest,
    responses(
        (status = 201, description = "Published", body = PostResponse),
        (status = 400, description = "Invalid draft, unknown category or daily limit reached", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Missing add_post permission", body = Error)
    ),
    tags = ["news"],
    operation_id = "createNews"
)]
#[post("/news")]
pub async fn create_news(
    state: web::Data<HttpState>,
    visitor: Visitor,
    payload: web::Json<PostDraftRequest>,
) -> ApiResult<HttpResponse> {
    create(&state, &visitor, PostKind::News, payload.into_inner()).await
}

/// Publish an article.
#[utoipa::path(
    post,
    path = "/api/v1/articles",
    request_body = PostDraftRequest,
    responses(
        (status = 201, description = "Published", body = PostResponse),
        (status = 400, description = "Invalid draft, unknown category or daily limit reached", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Missing add_post permission", body = Error)
    ),
    tags = ["news"],
    operation_id = "createArticle"
)]
#[post("/articles")]
pub async fn create_article(
    state: web::Data<HttpState>,
    visitor: Visitor,
    payload: web::Json<PostDraftRequest>,
) -> ApiResult<HttpResponse> {
    create(&state, &visitor, PostKind::Article, payload.into_inner()).await
}

/// Replace a post's title, content and categories.
#[utoipa::path(
    put,
    path = "/api/v1/news/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body = PostDraftRequest,
    responses(
        (status = 200, description = "Updated", body = PostResponse),
        (status = 400, description = "Invalid draft or unknown category", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Missing change_post permission", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["news"],
    operation_id = "updateNews"
)]
#[put("/news/{id}")]
pub async fn update_news(
    state: web::Data<HttpState>,
    visitor: Visitor,
    path: web::Path<i64>,
    payload: web::Json<PostDraftRequest>,
) -> ApiResult<web::Json<PostResponse>> {
    let user_id = visitor.require_signed_in()?;
    let draft = parse_draft(payload.into_inner())?;
    let post = state
        .posts
        .update(&user_id, PostId::new(path.into_inner()), draft)
        .await?;
    Ok(web::Json(PostResponse::from(&post)))
}

/// Remove a post.
#[utoipa::path(
    delete,
    path = "/api/v1/news/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Missing delete_post permission", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["news"],
    operation_id = "deleteNews"
)]
#[delete("/news/{id}")]
pub async fn delete_news(
    state: web::Data<HttpState>,
    visitor: Visitor,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user_id = visitor.require_signed_in()?;
    state
        .posts
        .delete(&user_id, PostId::new(path.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn rate(
    state: &HttpState,
    visitor: &Visitor,
    id: i64,
    change: RatingChange,
) -> ApiResult<web::Json<PostResponse>> {
    let user_id = visitor.require_signed_in()?;
    let post = state.posts.rate(&user_id, PostId::new(id), change).await?;
    Ok(web::Json(PostResponse::from(&post)))
}

/// Raise a post's rating by one.
#[utoipa::path(
    post,
    path = "/api/v1/news/{id}/like",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Rated post", body = PostResponse),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["news"],
    operation_id = "likeNews"
)]
#[post("/news/{id}/like")]
pub async fn like_news(
    state: web::Data<HttpState>,
    visitor: Visitor,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PostResponse>> {
    rate(&state, &visitor, path.into_inner(), RatingChange::Like).await
}

/// Lower a post's rating by one.
#[utoipa::path(
    post,
    path = "/api/v1/news/{id}/dislike",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Rated post", body = PostResponse),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["news"],
    operation_id = "dislikeNews"
)]
#[post("/news/{id}/dislike")]
pub async fn dislike_news(
    state: web::Data<HttpState>,
    visitor: Visitor,
    path: web::Path<i64>,
) -> ApiResult<web::Json<PostResponse>> {
    rate(&state, &visitor, path.into_inner(), RatingChange::Dislike).await
}

#[cfg(test)]
#[path = "news_tests.rs"]
mod tests;
