//! Builders for HTTP state and the task handler over the chosen repositories.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use newspaper::domain::ports::{
    CategoryRepository, PostRepository, TaskHandler, TaskQueue, UserRepository,
};
use newspaper::domain::{
    AccountsService, CategoriesService, DailyPostLimit, NotificationService, PostsService,
    PostsServiceDeps, SiteUrl,
};
use newspaper::inbound::http::state::HttpState;
use newspaper::outbound::mail::ConfiguredMailer;
use newspaper::outbound::memory::MemoryStore;
use newspaper::outbound::persistence::{
    DieselCategoryRepository, DieselPostRepository, DieselUserRepository,
};
use newspaper::outbound::security::Argon2PasswordHasher;

use super::ServerConfig;

/// Services shared by the HTTP workers and the task worker.
#[derive(Clone)]
pub(crate) struct AppServices {
    pub(crate) http_state: web::Data<HttpState>,
    pub(crate) task_handler: Arc<dyn TaskHandler>,
}

/// Collaborators that do not depend on the storage backend.
struct SharedDeps {
    queue: Arc<dyn TaskQueue>,
    clock: Arc<dyn Clock>,
    mailer: Arc<ConfiguredMailer>,
    site: SiteUrl,
    limit: DailyPostLimit,
}

/// Wire every service over one set of repositories.
fn assemble<U, P, C>(users: Arc<U>, posts: Arc<P>, categories: Arc<C>, deps: SharedDeps) -> AppServices
where
    U: UserRepository + 'static,
    P: PostRepository + 'static,
    C: CategoryRepository + 'static,
{
    let SharedDeps {
        queue,
        clock,
        mailer,
        site,
        limit,
    } = deps;

    let accounts = Arc::new(AccountsService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        clock.clone(),
    ));
    let post_service = Arc::new(PostsService::new(
        PostsServiceDeps {
            posts: posts.clone(),
            categories: categories.clone(),
            users: users.clone(),
            queue,
            clock: clock.clone(),
        },
        limit,
    ));
    let category_service = Arc::new(CategoriesService::new(
        categories.clone(),
        posts.clone(),
        users,
    ));
    let notifications = Arc::new(NotificationService::new(
        posts, categories, mailer, clock, site,
    ));

    AppServices {
        http_state: web::Data::new(HttpState::from_services(
            accounts,
            post_service,
            category_service,
        )),
        task_handler: notifications,
    }
}

/// Diesel repositories when a pool is configured, the in-memory store
/// otherwise.
pub(super) fn build_services(config: &ServerConfig, queue: Arc<dyn TaskQueue>) -> AppServices {
    let deps = SharedDeps {
        queue,
        clock: Arc::new(DefaultClock),
        mailer: Arc::new(config.mailer.clone()),
        site: config.site.clone(),
        limit: config.post_limit,
    };
    match &config.db_pool {
        Some(pool) => assemble(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselPostRepository::new(pool.clone())),
            Arc::new(DieselCategoryRepository::new(pool.clone())),
            deps,
        ),
        None => {
            let store = Arc::new(MemoryStore::new());
            assemble(store.clone(), store.clone(), store, deps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::{Key, SameSite};
    use newspaper::domain::{EmailAddress, Registration, Task};
    use newspaper::inbound::http::session_config::SessionSettings;
    use newspaper::outbound::queue::InProcessTaskQueue;
    use rstest::rstest;

    fn memory_config() -> ServerConfig {
        let from = EmailAddress::new("desk@paper.example").expect("sender");
        ServerConfig::new(
            SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
            "127.0.0.1:0".parse().expect("socket addr"),
            ConfiguredMailer::from_settings(None, &from).expect("log mailer"),
            SiteUrl::parse("http://paper.test").expect("site url"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn memory_mode_wires_accounts_end_to_end() {
        let (queue, _receiver) = InProcessTaskQueue::channel(4);
        let services = build_services(&memory_config(), Arc::new(queue));

        let registration =
            Registration::try_from_parts("ann", "ann@paper.example", "correct horse")
                .expect("registration shape");
        let user = services
            .http_state
            .accounts
            .signup(registration)
            .await
            .expect("signup succeeds");
        let profile = services
            .http_state
            .accounts_query
            .profile(user.id())
            .await
            .expect("profile loads");

        assert_eq!(profile.username().as_ref(), "ann");
        assert!(!profile.is_author());
    }

    #[rstest]
    #[tokio::test]
    async fn memory_mode_digest_runs_without_posts() {
        let (queue, _receiver) = InProcessTaskQueue::channel(4);
        let services = build_services(&memory_config(), Arc::new(queue));

        let report = services
            .task_handler
            .handle(&Task::WeeklyDigest)
            .await
            .expect("digest completes");

        assert_eq!(report.emails_sent, 0);
    }
}
