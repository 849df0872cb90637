//! Post categories and their subscribers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::API_BASE_PATH;
use super::user::{EmailAddress, UserId, Username};

/// Maximum category title length, counted in characters.
pub const CATEGORY_TITLE_MAX: usize = 64;

/// Validation errors for category values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryValidationError {
    #[error("category title must not be empty")]
    EmptyTitle,
    #[error("category title must be at most {max} characters")]
    TitleTooLong { max: usize },
}

/// Numeric category identifier assigned by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(i64);

impl CategoryId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unique category title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryTitle(String);

impl CategoryTitle {
    /// Validate a title. Surrounding whitespace is trimmed.
    pub fn new(title: impl AsRef<str>) -> Result<Self, CategoryValidationError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(CategoryValidationError::EmptyTitle);
        }
        if title.chars().count() > CATEGORY_TITLE_MAX {
            return Err(CategoryValidationError::TitleTooLong {
                max: CATEGORY_TITLE_MAX,
            });
        }
        Ok(Self(title.to_owned()))
    }
}

impl AsRef<str> for CategoryTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CategoryTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CategoryTitle> for String {
    fn from(value: CategoryTitle) -> Self {
        value.0
    }
}

impl TryFrom<String> for CategoryTitle {
    type Error = CategoryValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Category with its subscriber count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub title: CategoryTitle,
    pub subscriber_count: u64,
}

impl Category {
    /// Detail path relative to the site root.
    pub fn absolute_path(&self) -> String {
        format!("{API_BASE_PATH}/categories/{}", self.id)
    }

    pub fn summary(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

/// Category reference embedded in posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub title: CategoryTitle,
}

/// Subscriber contact details used for notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub user_id: UserId,
    pub username: Username,
    pub email: EmailAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("   ", CategoryValidationError::EmptyTitle)]
    #[case(&"x".repeat(CATEGORY_TITLE_MAX + 1), CategoryValidationError::TitleTooLong { max: CATEGORY_TITLE_MAX })]
    fn rejects_invalid_titles(#[case] raw: &str, #[case] expected: CategoryValidationError) {
        assert_eq!(CategoryTitle::new(raw), Err(expected));
    }

    #[rstest]
    fn trims_titles() {
        let title = CategoryTitle::new("  Sport ").expect("valid title");
        assert_eq!(title.as_ref(), "Sport");
    }

    #[rstest]
    fn detail_path_uses_id() {
        let category = Category {
            id: CategoryId::new(7),
            title: CategoryTitle::new("Science").expect("valid title"),
            subscriber_count: 0,
        };
        assert_eq!(category.absolute_path(), "/api/v1/categories/7");
    }
}
