//! HTTP inbound adapter exposing the JSON API.

pub mod accounts;
pub mod categories;
pub mod error;
pub mod health;
pub mod news;
pub mod news_dto;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`.
///
/// `/news/search` is registered before `/news/{id}` so the literal segment
/// wins.
///
/// # Examples
///
/// ```rust,ignore
/// App::new().service(web::scope("/api/v1").wrap(session).configure(api_services));
/// ```
pub fn api_services(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::signup)
        .service(accounts::login)
        .service(accounts::logout)
        .service(accounts::current_user)
        .service(accounts::change_password)
        .service(accounts::become_author)
        .service(news::list_news)
        .service(news::search_news)
        .service(news::news_detail)
        .service(news::create_news)
        .service(news::create_article)
        .service(news::update_news)
        .service(news::delete_news)
        .service(news::like_news)
        .service(news::dislike_news)
        .service(categories::list_categories)
        .service(categories::category_detail)
        .service(categories::toggle_subscription);
}
