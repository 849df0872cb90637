//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, the
//! request/response payloads and the session cookie security scheme. The
//! document backs Swagger UI in debug builds and is exported with
//! `cargo run --bin openapi-dump`.

use crate::domain::{Error, ErrorCode, Group, Permission, PostKind};
use crate::inbound::http::accounts::{
    LoginRequest, PasswordChangeRequest, ProfileResponse, SignupRequest,
};
use crate::inbound::http::categories::{CategoryDetailResponse, CategoryResponse};
use crate::inbound::http::news_dto::{
    AuthorSummary, CategorySummary, NewsPageResponse, PostDraftRequest, PostResponse,
    PostSummary,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Newspaper API",
        description = "Accounts, posts, categories and subscriptions of the newspaper site."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::change_password,
        crate::inbound::http::accounts::become_author,
        crate::inbound::http::news::list_news,
        crate::inbound::http::news::search_news,
        crate::inbound::http::news::news_detail,
        crate::inbound::http::news::create_news,
        crate::inbound::http::news::create_article,
        crate::inbound::http::news::update_news,
        crate::inbound::http::news::delete_news,
        crate::inbound::http::news::like_news,
        crate::inbound::http::news::dislike_news,
        crate::inbound::http::categories::list_categories,
        crate::inbound::http::categories::category_detail,
        crate::inbound::http::categories::toggle_subscription,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Group,
        Permission,
        PostKind,
        SignupRequest,
        LoginRequest,
        PasswordChangeRequest,
        ProfileResponse,
        PostDraftRequest,
        AuthorSummary,
        CategorySummary,
        PostSummary,
        PostResponse,
        NewsPageResponse,
        CategoryResponse,
        CategoryDetailResponse,
    )),
    tags(
        (name = "accounts", description = "Signup, login and profile"),
        (name = "news", description = "News items and articles"),
        (name = "categories", description = "Categories and subscriptions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn schema_named<'a>(doc: &'a utoipa::openapi::OpenApi, name: &str) -> &'a RefOr<Schema> {
        let schemas = &doc.components.as_ref().expect("components").schemas;
        schemas
            .iter()
            .find(|(key, _)| key.rsplit('.').next() == Some(name))
            .map(|(_, schema)| schema)
            .unwrap_or_else(|| panic!("schema {name} registered"))
    }

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/signup")]
    #[case("/api/v1/login")]
    #[case("/api/v1/me")]
    #[case("/api/v1/news")]
    #[case("/api/v1/news/search")]
    #[case("/api/v1/news/{id}")]
    #[case("/api/v1/news/{id}/like")]
    #[case("/api/v1/articles")]
    #[case("/api/v1/categories/{id}/subscription")]
    #[case("/health/ready")]
    fn document_lists_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn error_schema_has_code_and_message() {
        let doc = ApiDoc::openapi();
        let error = schema_named(&doc, "Error");
        assert_object_schema_has_field(error, "code");
        assert_object_schema_has_field(error, "message");
    }

    #[test]
    fn page_schema_exposes_author_flag() {
        let doc = ApiDoc::openapi();
        let page = schema_named(&doc, "NewsPageResponse");
        assert_object_schema_has_field(page, "isAuthor");
        assert_object_schema_has_field(page, "totalPages");
    }
}
