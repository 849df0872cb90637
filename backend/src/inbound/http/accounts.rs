//! Account API handlers.
//!
//! ```text
//! POST /api/v1/signup {"username":"ann","email":"ann@example.com","password":"correct horse"}
//! POST /api/v1/login {"username":"ann","password":"correct horse"}
//! POST /api/v1/logout
//! GET /api/v1/me
//! POST /api/v1/password {"currentPassword":"...","newPassword":"..."}
//! POST /api/v1/become-author
//! ```

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    Error, Group, LoginCredentials, PasswordChange, Permission, Registration, User,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::Visitor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PASSWORD, map_login_validation_error};

const NEW_PASSWORD: FieldName = FieldName::new("newPassword");

/// Sign-up request body for `POST /api/v1/signup`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Password change body for `POST /api/v1/password`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Account as returned to its owner.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub groups: Vec<Group>,
    pub permissions: Vec<Permission>,
    pub is_author: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            groups: user.groups().iter().copied().collect(),
            permissions: user.permissions().into_iter().collect(),
            is_author: user.is_author(),
            created_at: user.created_at(),
        }
    }
}

/// Register a new account in the `common` group.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username already taken", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let SignupRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let registration = Registration::try_from_parts(&username, &email, &password)
        .map_err(|err| map_login_validation_error(err, PASSWORD))?;
    let user = state.accounts.signup(registration).await?;
    Ok(HttpResponse::Created().json(ProfileResponse::from(&user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    visitor: Visitor,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&payload.username, &payload.password)
        .map_err(|err| map_login_validation_error(err, PASSWORD))?;
    let user_id = state.accounts.login(&credentials).await?;
    visitor.sign_in(&user_id)?;
    info!(user_id = %user_id, "user logged in");
    Ok(HttpResponse::Ok().finish())
}

/// End the session. Succeeds for anonymous callers too.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["accounts"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(visitor: Visitor) -> HttpResponse {
    visitor.sign_out();
    HttpResponse::NoContent().finish()
}

/// Profile of the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Login required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    visitor: Visitor,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user_id = visitor.require_signed_in()?;
    let user = state.accounts_query.profile(&user_id).await?;
    Ok(web::Json(ProfileResponse::from(&user)))
}

/// Replace the signed-in user's password.
#[utoipa::path(
    post,
    path = "/api/v1/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Login required or wrong current password", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "changePassword"
)]
#[post("/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    visitor: Visitor,
    payload: web::Json<PasswordChangeRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = visitor.require_signed_in()?;
    let change = PasswordChange::try_from_parts(&payload.current_password, &payload.new_password)
        .map_err(|err| map_login_validation_error(err, NEW_PASSWORD))?;
    state.accounts.change_password(&user_id, change).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Join the `authors` group, then go back where the request came from.
#[utoipa::path(
    post,
    path = "/api/v1/become-author",
    responses(
        (status = 303, description = "Promoted; redirect to the referring page", headers(("Location" = String, description = "Referer or /"))),
        (status = 401, description = "Login required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "becomeAuthor"
)]
#[post("/become-author")]
pub async fn become_author(
    state: web::Data<HttpState>,
    visitor: Visitor,
    request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let user_id = visitor.require_signed_in()?;
    state.accounts.become_author(&user_id).await?;
    let location = request
        .headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("/")
        .to_owned();
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish())
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
