//! Request and response payloads for post endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CategoryRef, Post, PostAuthor, PostDraft, PostKind, PostValidationError};

/// Title, content and categories shared by every post create/update body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDraftRequest {
    pub title: String,
    pub content: String,
    /// Category ids; at least one is required.
    #[serde(default)]
    pub categories: Vec<i64>,
}

impl TryFrom<PostDraftRequest> for PostDraft {
    type Error = PostValidationError;

    fn try_from(value: PostDraftRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.title, &value.content, &value.categories)
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
}

impl From<&PostAuthor> for AuthorSummary {
    fn from(author: &PostAuthor) -> Self {
        Self {
            id: author.id.to_string(),
            username: author.username.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: i64,
    pub title: String,
}

impl From<&CategoryRef> for CategorySummary {
    fn from(category: &CategoryRef) -> Self {
        Self {
            id: category.id.get(),
            title: category.title.to_string(),
        }
    }
}

/// Post as shown in lists: content is cut down to a preview.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub kind: PostKind,
    pub title: String,
    /// First 124 characters of the content followed by `...`.
    pub preview: String,
    pub author: AuthorSummary,
    pub categories: Vec<CategorySummary>,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
    /// Site-relative detail path, e.g. `/api/v1/news/7`.
    pub url: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.get(),
            kind: post.kind,
            title: post.title.to_string(),
            preview: post.preview(),
            author: AuthorSummary::from(&post.author),
            categories: post.categories.iter().map(CategorySummary::from).collect(),
            rating: post.rating,
            created_at: post.created_at,
            url: post.absolute_path(),
        }
    }
}

/// Full post with its content.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub kind: PostKind,
    pub title: String,
    pub content: String,
    pub author: AuthorSummary,
    pub categories: Vec<CategorySummary>,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

impl From<&Post> for PostResponse {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.get(),
            kind: post.kind,
            title: post.title.to_string(),
            content: post.content.as_ref().to_owned(),
            author: AuthorSummary::from(&post.author),
            categories: post.categories.iter().map(CategorySummary::from).collect(),
            rating: post.rating,
            created_at: post.created_at,
            url: post.absolute_path(),
        }
    }
}

/// One page of the newest-first post list.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsPageResponse {
    pub items: Vec<PostSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    /// `self`, `next` and `prev` links.
    #[schema(value_type = Object)]
    pub links: pagination::PageLinks,
    /// Whether the signed-in viewer may publish; `false` when anonymous.
    pub is_author: bool,
}

impl NewsPageResponse {
    pub fn new(page: pagination::Page<PostSummary>, is_author: bool) -> Self {
        Self {
            items: page.items,
            page: page.page,
            per_page: page.per_page,
            total_items: page.total_items,
            total_pages: page.total_pages,
            links: page.links,
            is_author,
        }
    }
}

/// Query string accepted by `GET /api/v1/news/search`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive title fragment.
    pub title: Option<String>,
    /// Case-insensitive author username fragment.
    pub author_name: Option<String>,
    /// Keep posts created strictly after this RFC 3339 timestamp or date.
    pub date_after: Option<String>,
}

/// Query string accepted by `GET /api/v1/news`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number; defaults to 1.
    pub page: Option<String>,
}
