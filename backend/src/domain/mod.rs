//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed domain entities and the use-cases that act
//! on them. Nothing here depends on actix, diesel or lettre; adapters live in
//! the inbound and outbound modules.

/// Path prefix every HTTP resource is served under.
pub const API_BASE_PATH: &str = "/api/v1";

pub mod access;
pub mod accounts_service;
pub mod auth;
pub mod author;
pub mod categories_service;
pub mod category;
pub mod error;
pub mod notification;
pub mod notification_service;
pub mod ports;
pub mod post;
pub mod post_limit;
pub mod posts_service;
pub mod tasks;
#[cfg(test)]
pub(crate) mod test_fixtures;
pub mod trace_id;
pub mod user;

pub use self::access::{Group, Permission, UnknownGroupError, permissions_for};
pub use self::accounts_service::AccountsService;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MIN, PasswordChange, PasswordHash,
    Registration,
};
pub use self::author::{Author, AuthorId};
pub use self::categories_service::CategoriesService;
pub use self::category::{
    CATEGORY_TITLE_MAX, Category, CategoryId, CategoryRef, CategoryTitle,
    CategoryValidationError, Subscriber,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::notification::{
    DIGEST_SUBJECT, EmailMessage, NOTIFICATION_EXCERPT_CHARS, SiteUrl, SiteUrlError,
};
pub use self::notification_service::{DIGEST_WINDOW_DAYS, NotificationService};
pub use self::post::{
    NewPost, POST_TITLE_MAX, PREVIEW_CHARS, Post, PostAuthor, PostContent, PostDraft, PostId,
    PostKind, PostTitle, PostValidationError, RatingChange, SearchFilter,
};
pub use self::post_limit::{DEFAULT_MAX_POSTS_PER_DAY, DailyPostLimit, PostQuota};
pub use self::posts_service::{PostsService, PostsServiceDeps};
pub use self::tasks::Task;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EMAIL_LOCAL_MAX, EMAIL_MAX, EmailAddress, USERNAME_MAX, User, UserId, UserValidationError, Username};
