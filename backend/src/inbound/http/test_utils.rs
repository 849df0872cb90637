//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, Route, test, web};

use super::session::Visitor;
use super::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use super::state::HttpState;
use crate::domain::ports::{
    MockAccountsCommand, MockAccountsQuery, MockCategoriesCommand, MockCategoriesQuery,
    MockPostsCommand, MockPostsQuery,
};
use crate::domain::{Error, UserId};

/// Build a session middleware configured for tests.
///
/// Generates a fresh key per invocation and disables the `Secure` flag so
/// plain HTTP test requests keep the cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    }
    .middleware()
}

/// Mocked driving ports, one per [`HttpState`] field.
///
/// Tests set expectations on the ports they exercise and call
/// [`MockPorts::into_state`]; untouched mocks fail loudly if called.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountsCommand,
    pub accounts_query: MockAccountsQuery,
    pub posts: MockPostsCommand,
    pub posts_query: MockPostsQuery,
    pub categories: MockCategoriesCommand,
    pub categories_query: MockCategoriesQuery,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState {
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            posts: Arc::new(self.posts),
            posts_query: Arc::new(self.posts_query),
            categories: Arc::new(self.categories),
            categories_query: Arc::new(self.categories_query),
        })
    }
}

/// Extract the session cookie from a response that set one.
pub fn session_cookie(response: &ServiceResponse) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Path of the route registered by [`login_as`].
pub const TEST_LOGIN_PATH: &str = "/test/login";

/// Route that signs in `user_id`, for tests that need an existing session.
///
/// Mount it at [`TEST_LOGIN_PATH`] and fetch the cookie with [`sign_in`].
pub fn login_as(user_id: UserId) -> Route {
    web::get().to(move |visitor: Visitor| {
        let user_id = user_id.clone();
        async move {
            visitor.sign_in(&user_id)?;
            Ok::<_, Error>(HttpResponse::Ok().finish())
        }
    })
}

/// Hit [`TEST_LOGIN_PATH`] and return the resulting session cookie.
pub async fn sign_in<S>(app: &S) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response =
        test::call_service(app, test::TestRequest::get().uri(TEST_LOGIN_PATH).to_request()).await;
    session_cookie(&response)
}
