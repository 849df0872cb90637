//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountsCommand, AccountsQuery, CategoriesCommand, CategoriesQuery, PostsCommand, PostsQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountsCommand>,
    pub accounts_query: Arc<dyn AccountsQuery>,
    pub posts: Arc<dyn PostsCommand>,
    pub posts_query: Arc<dyn PostsQuery>,
    pub categories: Arc<dyn CategoriesCommand>,
    pub categories_query: Arc<dyn CategoriesQuery>,
}

impl HttpState {
    /// Bundle services that implement both halves of each port pair.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let state = HttpState::from_services(accounts, posts, categories);
    /// let data = actix_web::web::Data::new(state);
    /// ```
    pub fn from_services<A, P, C>(accounts: Arc<A>, posts: Arc<P>, categories: Arc<C>) -> Self
    where
        A: AccountsCommand + AccountsQuery + 'static,
        P: PostsCommand + PostsQuery + 'static,
        C: CategoriesCommand + CategoriesQuery + 'static,
    {
        Self {
            accounts: accounts.clone(),
            accounts_query: accounts,
            posts: posts.clone(),
            posts_query: posts,
            categories: categories.clone(),
            categories_query: categories,
        }
    }
}
