//! Posts (news items and articles) and the value types around them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::API_BASE_PATH;
use super::author::AuthorId;
use super::category::{CategoryId, CategoryRef};
use super::user::Username;

/// Maximum post title length, counted in characters.
pub const POST_TITLE_MAX: usize = 128;

/// Characters of content shown in list previews.
pub const PREVIEW_CHARS: usize = 124;

/// Validation errors for post inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("content must not be empty")]
    EmptyContent,
    #[error("at least one category is required")]
    NoCategories,
    #[error("unknown post kind: {0}")]
    UnknownKind(String),
    #[error("dateAfter must be an RFC 3339 timestamp or a YYYY-MM-DD date")]
    InvalidDate,
}

/// Numeric post identifier assigned by storage in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(i64);

impl PostId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a post is a short news item or a long-form article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    News,
    Article,
}

impl PostKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Article => "article",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = PostValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "news" => Ok(Self::News),
            "article" => Ok(Self::Article),
            other => Err(PostValidationError::UnknownKind(other.to_owned())),
        }
    }
}

/// Post headline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn new(title: impl AsRef<str>) -> Result<Self, PostValidationError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(PostValidationError::EmptyTitle);
        }
        if title.chars().count() > POST_TITLE_MAX {
            return Err(PostValidationError::TitleTooLong {
                max: POST_TITLE_MAX,
            });
        }
        Ok(Self(title.to_owned()))
    }
}

impl AsRef<str> for PostTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PostTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Post body text; kept verbatim apart from the emptiness check.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostContent(String);

impl PostContent {
    pub fn new(content: impl Into<String>) -> Result<Self, PostValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(PostValidationError::EmptyContent);
        }
        Ok(Self(content))
    }

    /// First `chars` characters of the content.
    ///
    /// # Examples
    /// ```
    /// use newspaper::domain::PostContent;
    ///
    /// let content = PostContent::new("Привет, мир").unwrap();
    /// assert_eq!(content.excerpt(6), "Привет");
    /// ```
    pub fn excerpt(&self, chars: usize) -> &str {
        match self.0.char_indices().nth(chars) {
            Some((index, _)) => &self.0[..index],
            None => self.0.as_str(),
        }
    }
}

impl AsRef<str> for PostContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Author reference embedded in posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostAuthor {
    pub id: AuthorId,
    pub username: Username,
}

/// Published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub kind: PostKind,
    pub author: PostAuthor,
    pub title: PostTitle,
    pub content: PostContent,
    /// Categories ordered by title.
    pub categories: Vec<CategoryRef>,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Short preview: the first [`PREVIEW_CHARS`] characters followed by `...`.
    pub fn preview(&self) -> String {
        format!("{}...", self.content.excerpt(PREVIEW_CHARS))
    }

    /// Detail path relative to the site root.
    pub fn absolute_path(&self) -> String {
        format!("{API_BASE_PATH}/news/{}", self.id)
    }
}

/// Validated title, content and category selection for a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: PostTitle,
    pub content: PostContent,
    /// Distinct category ids in request order.
    pub categories: Vec<CategoryId>,
}

impl PostDraft {
    pub fn try_from_parts(
        title: &str,
        content: &str,
        categories: &[i64],
    ) -> Result<Self, PostValidationError> {
        let title = PostTitle::new(title)?;
        let content = PostContent::new(content)?;
        let mut ids: Vec<CategoryId> = Vec::with_capacity(categories.len());
        for id in categories.iter().copied().map(CategoryId::new) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(PostValidationError::NoCategories);
        }
        Ok(Self {
            title,
            content,
            categories: ids,
        })
    }
}

/// Post ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author: AuthorId,
    pub kind: PostKind,
    pub draft: PostDraft,
    pub created_at: DateTime<Utc>,
}

/// Like or dislike applied to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingChange {
    Like,
    Dislike,
}

impl RatingChange {
    pub const fn delta(self) -> i64 {
        match self {
            Self::Like => 1,
            Self::Dislike => -1,
        }
    }
}

/// Optional filters for post search; absent filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    title: Option<String>,
    author_name: Option<String>,
    created_after: Option<DateTime<Utc>>,
}

impl SearchFilter {
    /// Build a filter from raw query values. Blank values are ignored.
    ///
    /// `date_after` accepts an RFC 3339 timestamp or a `YYYY-MM-DD` date,
    /// the latter meaning midnight UTC.
    pub fn try_from_parts(
        title: Option<&str>,
        author_name: Option<&str>,
        date_after: Option<&str>,
    ) -> Result<Self, PostValidationError> {
        let created_after = non_blank(date_after).map(parse_date_after).transpose()?;
        Ok(Self {
            title: non_blank(title).map(str::to_lowercase),
            author_name: non_blank(author_name).map(str::to_lowercase),
            created_after,
        })
    }

    /// Lower-cased title fragment.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Lower-cased author username fragment.
    pub fn author_name(&self) -> Option<&str> {
        self.author_name.as_deref()
    }

    /// Exclusive lower bound on `created_at`.
    pub fn created_after(&self) -> Option<DateTime<Utc>> {
        self.created_after
    }

    /// Whether `post` satisfies every present filter.
    pub fn matches(&self, post: &Post) -> bool {
        let title_ok = self
            .title()
            .is_none_or(|needle| post.title.as_ref().to_lowercase().contains(needle));
        let author_ok = self.author_name().is_none_or(|needle| {
            post.author.username.as_ref().to_lowercase().contains(needle)
        });
        let date_ok = self
            .created_after
            .is_none_or(|after| post.created_at > after);
        title_ok && author_ok && date_ok
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date_after(raw: &str) -> Result<DateTime<Utc>, PostValidationError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or(PostValidationError::InvalidDate)
}
