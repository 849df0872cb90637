//! Tests for the domain user model.

use super::*;
use chrono::TimeZone;
use rstest::{fixture, rstest};

const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

#[fixture]
fn reader() -> User {
    User::new(
        UserId::new(VALID_ID).expect("fixture id"),
        Username::new("reader").expect("fixture username"),
        EmailAddress::new("reader@example.com").expect("fixture email"),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("fixture timestamp"),
    )
}

#[rstest]
#[case("", UserValidationError::EmptyId)]
#[case("not-a-uuid", UserValidationError::InvalidId)]
#[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(UserId::new(raw), Err(expected));
}

#[rstest]
fn user_id_round_trips_through_serde() {
    let id = UserId::new(VALID_ID).expect("valid id");
    let json = serde_json::to_string(&id).expect("serialise id");
    assert_eq!(json, format!("\"{VALID_ID}\""));
    let back: UserId = serde_json::from_str(&json).expect("deserialise id");
    assert_eq!(back, id);
}

#[rstest]
#[case("   ", UserValidationError::EmptyUsername)]
#[case("has space", UserValidationError::UsernameInvalidCharacters)]
#[case("semi;colon", UserValidationError::UsernameInvalidCharacters)]
fn username_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(Username::new(raw), Err(expected));
}

#[rstest]
fn username_rejects_overlong_input() {
    let raw = "a".repeat(USERNAME_MAX + 1);
    assert_eq!(
        Username::new(raw),
        Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX })
    );
}

#[rstest]
#[case("  editor  ", "editor")]
#[case("first.last+news@desk", "first.last+news@desk")]
#[case("under_score-dash", "under_score-dash")]
fn username_accepts_allowed_characters(#[case] raw: &str, #[case] expected: &str) {
    let username = Username::new(raw).expect("valid username");
    assert_eq!(username.as_ref(), expected);
}

#[rstest]
#[case("", UserValidationError::EmptyEmail)]
#[case("missing-at", UserValidationError::InvalidEmail)]
#[case("@example.com", UserValidationError::InvalidEmail)]
#[case("reader@", UserValidationError::InvalidEmail)]
#[case("a@b@c", UserValidationError::InvalidEmail)]
#[case("re ader@example.com", UserValidationError::InvalidEmail)]
#[case("a<b@example.com", UserValidationError::InvalidEmail)]
#[case("a,b@example.com", UserValidationError::InvalidEmail)]
#[case("a\"b@example.com", UserValidationError::InvalidEmail)]
#[case("reader@exa_mple.com", UserValidationError::InvalidEmail)]
#[case(".reader@example.com", UserValidationError::InvalidEmail)]
#[case("re..ader@example.com", UserValidationError::InvalidEmail)]
#[case("reader@example..com", UserValidationError::InvalidEmail)]
#[case("reader@-example.com", UserValidationError::InvalidEmail)]
fn email_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
    assert_eq!(EmailAddress::new(raw), Err(expected));
}

#[rstest]
#[case("reader@example.com")]
#[case("o'brien+news@mail.paper.test")]
#[case("first.last@desk")]
#[case("x_y%z@paper-test.example")]
fn email_accepts_plain_mailboxes(#[case] raw: &str) {
    assert_eq!(EmailAddress::new(raw).expect("valid email").as_ref(), raw);
}

fn longest_email(last_label: usize) -> String {
    format!(
        "{}@{}.{}.{}",
        "a".repeat(EMAIL_LOCAL_MAX),
        "b".repeat(63),
        "c".repeat(63),
        "d".repeat(last_label)
    )
}

#[rstest]
fn email_length_is_capped() {
    let fits = longest_email(61);
    assert_eq!(fits.len(), EMAIL_MAX);
    assert!(EmailAddress::new(&fits).is_ok());
    assert_eq!(
        EmailAddress::new(longest_email(62)),
        Err(UserValidationError::EmailTooLong { max: EMAIL_MAX })
    );
}

#[rstest]
fn email_local_part_is_capped() {
    let email = format!("{}@example.com", "a".repeat(EMAIL_LOCAL_MAX + 1));
    assert_eq!(
        EmailAddress::new(email),
        Err(UserValidationError::EmailLocalPartTooLong {
            max: EMAIL_LOCAL_MAX
        })
    );
}

#[rstest]
fn new_users_join_common_group(reader: User) {
    assert_eq!(reader.groups(), &BTreeSet::from([Group::Common]));
    assert!(!reader.is_author());
    assert!(reader.permissions().is_empty());
}

#[rstest]
fn authors_receive_post_permissions(reader: User) {
    let author = reader.with_groups([Group::Authors]);

    assert!(author.groups().contains(&Group::Common));
    assert!(author.is_author());
    assert!(author.has_permission(Permission::AddPost));
    assert!(author.has_permission(Permission::ChangePost));
    assert!(author.has_permission(Permission::DeletePost));
}
