//! Category and subscription handlers.
//!
//! ```text
//! GET /api/v1/categories
//! GET /api/v1/categories/{id}
//! POST /api/v1/categories/{id}/subscription
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{API_BASE_PATH, Category, CategoryId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::news_dto::PostSummary;
use crate::inbound::http::session::Visitor;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub title: String,
    pub subscriber_count: u64,
    /// Site-relative detail path, e.g. `/api/v1/categories/3`.
    pub url: String,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.get(),
            title: category.title.to_string(),
            subscriber_count: category.subscriber_count,
            url: category.absolute_path(),
        }
    }
}

/// Category with its posts and the viewer's subscription state.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetailResponse {
    #[serde(flatten)]
    pub category: CategoryResponse,
    /// Always `false` for anonymous viewers.
    pub subscribed: bool,
    /// Newest first.
    pub posts: Vec<PostSummary>,
}

/// All categories ordered by title.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories", body = [CategoryResponse]),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["categories"],
    operation_id = "listCategories",
    security([])
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<CategoryResponse>>> {
    let categories = state.categories_query.list().await?;
    Ok(web::Json(
        categories.iter().map(CategoryResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category detail", body = CategoryDetailResponse),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["categories"],
    operation_id = "getCategory",
    security([])
)]
#[get("/categories/{id}")]
pub async fn category_detail(
    state: web::Data<HttpState>,
    visitor: Visitor,
    path: web::Path<i64>,
) -> ApiResult<web::Json<CategoryDetailResponse>> {
    let detail = state
        .categories_query
        .detail(CategoryId::new(path.into_inner()), visitor.signed_in()?)
        .await?;
    Ok(web::Json(CategoryDetailResponse {
        category: CategoryResponse::from(&detail.category),
        subscribed: detail.subscribed,
        posts: detail.posts.iter().map(PostSummary::from).collect(),
    }))
}

/// Subscribe to the category, or unsubscribe when already subscribed.
#[utoipa::path(
    post,
    path = "/api/v1/categories/{id}/subscription",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 303, description = "Toggled; redirect to the category", headers(("Location" = String, description = "Category detail path"))),
        (status = 401, description = "Login required", body = Error),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["categories"],
    operation_id = "toggleSubscription"
)]
#[post("/categories/{id}/subscription")]
pub async fn toggle_subscription(
    state: web::Data<HttpState>,
    visitor: Visitor,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let user_id = visitor.require_signed_in()?;
    let id = CategoryId::new(path.into_inner());
    state.categories.toggle_subscription(&user_id, id).await?;
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, format!("{API_BASE_PATH}/categories/{id}")))
        .finish())
}
