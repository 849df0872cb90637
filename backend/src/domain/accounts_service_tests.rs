//! Tests for the account service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{MockPasswordHasher, MockUserRepository, StoredCredentials};
use crate::domain::test_fixtures::{FixedClock, timestamp, user};
use crate::domain::{Author, AuthorId, ErrorCode, Group, PasswordHash};
use rstest::rstest;

fn make_service(
    users: MockUserRepository,
    hasher: MockPasswordHasher,
) -> AccountsService<MockUserRepository, MockPasswordHasher> {
    AccountsService::new(
        Arc::new(users),
        Arc::new(hasher),
        Arc::new(FixedClock(timestamp(2024, 6, 1, 12))),
    )
}

fn stored(user: &User) -> StoredCredentials {
    StoredCredentials {
        user: user.clone(),
        password_hash: PasswordHash::new("stored-hash"),
    }
}

#[tokio::test]
async fn signup_hashes_password_and_stores_common_member() {
    let mut users = MockUserRepository::new();
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .withf(|password| password == "correct horse")
        .times(1)
        .return_once(|_| Ok(PasswordHash::new("argon-hash")));
    users
        .expect_create()
        .withf(|user, hash| {
            user.username().as_ref() == "reader"
                && user.groups().contains(&Group::Common)
                && hash.as_str() == "argon-hash"
        })
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(users, hasher);
    let registration = Registration::try_from_parts("reader", "reader@example.com", "correct horse")
        .expect("valid registration");

    let created = service.signup(registration).await.expect("signup succeeds");
    assert_eq!(created.username().as_ref(), "reader");
    assert_eq!(created.created_at(), timestamp(2024, 6, 1, 12));
    assert!(!created.is_author());
}

#[tokio::test]
async fn signup_rejects_taken_usernames() {
    let mut users = MockUserRepository::new();
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(|_| Ok(PasswordHash::new("argon-hash")));
    users
        .expect_create()
        .return_once(|_, _| Err(UserRepositoryError::duplicate_username("reader")));

    let service = make_service(users, hasher);
    let registration = Registration::try_from_parts("reader", "reader@example.com", "correct horse")
        .expect("valid registration");

    let err = service
        .signup(registration)
        .await
        .expect_err("duplicate username fails");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(true, None)]
#[case(false, Some(ErrorCode::Unauthorized))]
#[tokio::test]
async fn login_verifies_the_stored_hash(
    #[case] password_matches: bool,
    #[case] expected_error: Option<ErrorCode>,
) {
    let account = user("reader");
    let expected_id = account.id().clone();
    let mut users = MockUserRepository::new();
    let mut hasher = MockPasswordHasher::new();
    let credentials = stored(&account);
    users
        .expect_find_credentials()
        .withf(|username| username == "reader")
        .return_once(move |_| Ok(Some(credentials)));
    hasher
        .expect_verify()
        .withf(|password, hash| password == "secret" && hash.as_str() == "stored-hash")
        .return_once(move |_, _| Ok(password_matches));

    let service = make_service(users, hasher);
    let creds = LoginCredentials::try_from_parts("reader", "secret").expect("credentials");

    match (service.login(&creds).await, expected_error) {
        (Ok(id), None) => assert_eq!(id, expected_id),
        (Err(err), Some(code)) => {
            assert_eq!(err.code(), code);
            assert_eq!(err.message(), "invalid credentials");
        }
        (other, _) => panic!("unexpected login outcome: {other:?}"),
    }
}

#[tokio::test]
async fn login_with_unknown_username_still_runs_a_verification() {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().return_once(|_| Ok(None));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .withf(|password, hash| password == "secret" && hash.as_str() == UNKNOWN_USER_HASH)
        .times(1)
        .return_once(|_, _| Ok(false));

    let service = make_service(users, hasher);
    let creds = LoginCredentials::try_from_parts("ghost", "secret").expect("credentials");

    let err = service.login(&creds).await.expect_err("unknown user fails");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), "invalid credentials");
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let account = user("reader");
    let id = account.id().clone();
    let lookup = account.clone();
    let credentials = stored(&account);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(lookup)));
    users
        .expect_find_credentials()
        .return_once(move |_| Ok(Some(credentials)));
    users.expect_update_password_hash().never();
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().return_once(|_, _| Ok(false));

    let service = make_service(users, hasher);
    let change = PasswordChange::try_from_parts("wrong", "new secret value").expect("change");

    let err = service
        .change_password(&id, change)
        .await
        .expect_err("wrong current password fails");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn change_password_stores_new_hash() {
    let account = user("reader");
    let id = account.id().clone();
    let lookup = account.clone();
    let credentials = stored(&account);
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(lookup)));
    users
        .expect_find_credentials()
        .return_once(move |_| Ok(Some(credentials)));
    users
        .expect_update_password_hash()
        .withf(|_, hash| hash.as_str() == "fresh-hash")
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().return_once(|_, _| Ok(true));
    hasher
        .expect_hash()
        .return_once(|_| Ok(PasswordHash::new("fresh-hash")));

    let service = make_service(users, hasher);
    let change = PasswordChange::try_from_parts("old secret", "new secret value").expect("change");

    service
        .change_password(&id, change)
        .await
        .expect("password change succeeds");
}

#[tokio::test]
async fn become_author_promotes_common_members() {
    let account = user("reader");
    let id = account.id().clone();
    let before = account.clone();
    let after = account.clone().with_groups([Group::Authors]);
    let author = Author::new(
        AuthorId::random(),
        account.id().clone(),
        account.username().clone(),
        0,
    );

    let mut users = MockUserRepository::new();
    let mut lookups = vec![after, before];
    users
        .expect_find_by_id()
        .times(2)
        .returning(move |_| Ok(lookups.pop()));
    users
        .expect_promote_to_author()
        .times(1)
        .return_once(move |_| Ok(author));

    let service = make_service(users, MockPasswordHasher::new());
    let promoted = service.become_author(&id).await.expect("promotion succeeds");
    assert!(promoted.is_author());
}

#[tokio::test]
async fn become_author_is_idempotent() {
    let account = user("writer").with_groups([Group::Authors]);
    let id = account.id().clone();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(account)));
    users.expect_promote_to_author().never();

    let service = make_service(users, MockPasswordHasher::new());
    let unchanged = service.become_author(&id).await.expect("no-op succeeds");
    assert!(unchanged.is_author());
}

#[tokio::test]
async fn profile_of_deleted_account_is_unauthorised() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));

    let service = make_service(users, MockPasswordHasher::new());
    let err = service
        .profile(&UserId::random())
        .await
        .expect_err("missing user fails");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn repository_outages_map_to_service_unavailable() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(|_| Err(UserRepositoryError::connection("pool timed out")));

    let service = make_service(users, MockPasswordHasher::new());
    let err = service
        .is_author(&UserId::random())
        .await
        .expect_err("outage fails");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
