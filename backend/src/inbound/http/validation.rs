//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain constructors report *what* is wrong; these helpers attach the
//! request field and a stable machine-readable code so clients can highlight
//! the offending input.

use pagination::{DEFAULT_PER_PAGE, PageRequest};
use serde_json::json;

use crate::domain::{Error, LoginValidationError, PostValidationError, UserValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    EmptyUsername,
    InvalidUsername,
    InvalidEmail,
    EmptyPassword,
    PasswordTooShort,
    EmptyTitle,
    TitleTooLong,
    EmptyContent,
    MissingCategories,
    InvalidTimestamp,
    InvalidPage,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::EmptyUsername => "empty_username",
            Self::InvalidUsername => "invalid_username",
            Self::InvalidEmail => "invalid_email",
            Self::EmptyPassword => "empty_password",
            Self::PasswordTooShort => "password_too_short",
            Self::EmptyTitle => "empty_title",
            Self::TitleTooLong => "title_too_long",
            Self::EmptyContent => "empty_content",
            Self::MissingCategories => "missing_categories",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidPage => "invalid_page",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const USERNAME: FieldName = FieldName::new("username");
pub(crate) const EMAIL: FieldName = FieldName::new("email");
pub(crate) const PASSWORD: FieldName = FieldName::new("password");
pub(crate) const TITLE: FieldName = FieldName::new("title");
pub(crate) const CONTENT: FieldName = FieldName::new("content");
pub(crate) const CATEGORIES: FieldName = FieldName::new("categories");
pub(crate) const DATE_AFTER: FieldName = FieldName::new("dateAfter");

pub(crate) fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

/// Map account input failures; `password_field` names the password being set.
pub(crate) fn map_login_validation_error(
    err: LoginValidationError,
    password_field: FieldName,
) -> Error {
    let message = err.to_string();
    match err {
        LoginValidationError::EmptyUsername => {
            field_error(USERNAME, ErrorCode::EmptyUsername, message)
        }
        LoginValidationError::EmptyPassword => {
            field_error(password_field, ErrorCode::EmptyPassword, message)
        }
        LoginValidationError::PasswordTooShort { .. } => {
            field_error(password_field, ErrorCode::PasswordTooShort, message)
        }
        LoginValidationError::User(inner) => map_user_validation_error(inner),
    }
}

fn map_user_validation_error(err: UserValidationError) -> Error {
    let message = err.to_string();
    match err {
        UserValidationError::EmptyUsername => {
            field_error(USERNAME, ErrorCode::EmptyUsername, message)
        }
        UserValidationError::UsernameTooLong { .. }
        | UserValidationError::UsernameInvalidCharacters => {
            field_error(USERNAME, ErrorCode::InvalidUsername, message)
        }
        UserValidationError::EmptyEmail
        | UserValidationError::EmailTooLong { .. }
        | UserValidationError::EmailLocalPartTooLong { .. }
        | UserValidationError::InvalidEmail => {
            field_error(EMAIL, ErrorCode::InvalidEmail, message)
        }
        UserValidationError::EmptyId | UserValidationError::InvalidId => {
            Error::invalid_request(message)
        }
    }
}

pub(crate) fn map_post_validation_error(err: PostValidationError) -> Error {
    let message = err.to_string();
    match err {
        PostValidationError::EmptyTitle => field_error(TITLE, ErrorCode::EmptyTitle, message),
        PostValidationError::TitleTooLong { .. } => {
            field_error(TITLE, ErrorCode::TitleTooLong, message)
        }
        PostValidationError::EmptyContent => {
            field_error(CONTENT, ErrorCode::EmptyContent, message)
        }
        PostValidationError::NoCategories => {
            field_error(CATEGORIES, ErrorCode::MissingCategories, message)
        }
        PostValidationError::InvalidDate => {
            field_error(DATE_AFTER, ErrorCode::InvalidTimestamp, message)
        }
        PostValidationError::UnknownKind(_) => Error::invalid_request(message),
    }
}

/// Parse the `?page=` query value into a request for a page of
/// [`DEFAULT_PER_PAGE`] items.
///
/// A missing value means the first page. Anything that is not a positive
/// integer is treated like a page past the end: `404 Not Found`.
pub(crate) fn parse_page(raw: Option<&str>) -> Result<PageRequest, Error> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(PageRequest::first());
    };
    raw.parse::<u32>()
        .ok()
        .and_then(|page| PageRequest::new(page, DEFAULT_PER_PAGE).ok())
        .ok_or_else(|| {
            Error::not_found(format!("invalid page: {raw}")).with_details(json!({
                "field": "page",
                "value": raw,
                "code": ErrorCode::InvalidPage.as_str(),
            }))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    #[rstest]
    #[case(None, 1)]
    #[case(Some(""), 1)]
    #[case(Some("3"), 3)]
    #[case(Some(" 2 "), 2)]
    fn pages_parse(#[case] raw: Option<&str>, #[case] expected: u32) {
        let request = parse_page(raw).expect("valid page");
        assert_eq!(request.page(), expected);
        assert_eq!(request.per_page(), DEFAULT_PER_PAGE);
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("last")]
    fn bad_pages_are_not_found(#[case] raw: &str) {
        let err = parse_page(Some(raw)).expect_err("invalid page");
        assert_eq!(err.code(), DomainCode::NotFound);
    }

    #[rstest]
    #[case(LoginValidationError::EmptyUsername, "username", "empty_username")]
    #[case(LoginValidationError::PasswordTooShort { min: 8 }, "newPassword", "password_too_short")]
    #[case(
        LoginValidationError::User(UserValidationError::InvalidEmail),
        "email",
        "invalid_email"
    )]
    fn login_errors_name_the_field(
        #[case] err: LoginValidationError,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let mapped = map_login_validation_error(err, FieldName::new("newPassword"));
        let details = mapped.details().expect("details present");
        assert_eq!(details["field"], field);
        assert_eq!(details["code"], code);
    }

    #[rstest]
    fn missing_categories_point_at_categories() {
        let mapped = map_post_validation_error(PostValidationError::NoCategories);
        assert_eq!(mapped.code(), DomainCode::InvalidRequest);
        assert_eq!(
            mapped.details().and_then(|d| d.get("field")),
            Some(&json!("categories"))
        );
    }
}
