//! Integration tests for the Diesel repositories against embedded PostgreSQL.
//!
//! The services run unchanged over `DieselUserRepository`,
//! `DieselPostRepository` and `DieselCategoryRepository`, so these tests cover
//! the SQL behind signup, publishing, subscriptions and the digest queries.
//!
//! # Runtime Strategy
//!
//! Cluster bootstrap blocks, so tests stay synchronous and drive the async
//! services through a Tokio runtime owned by the fixture.

use std::sync::Arc;

use futures_util::future::join_all;
use mockable::DefaultClock;
use newspaper::domain::ports::{
    AccountsCommand, AccountsQuery, CategoriesCommand, CategoriesQuery, PostsCommand, PostsQuery,
};
use newspaper::domain::{
    AccountsService, CategoriesService, Category, CategoryTitle, DailyPostLimit, ErrorCode,
    LoginCredentials, NotificationService, Post, PostDraft, PostKind, PostsService,
    PostsServiceDeps, RatingChange, Registration, SearchFilter, SiteUrl, Task, User,
};
use newspaper::outbound::mail::RecordingMailer;
use newspaper::outbound::persistence::{
    DbPool, DieselCategoryRepository, DieselPostRepository, DieselUserRepository, PoolConfig,
    run_pending_migrations,
};
use newspaper::outbound::queue::{InProcessTaskQueue, QueuedTask};
use newspaper::outbound::security::Argon2PasswordHasher;
use pagination::PageRequest;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

#[path = "support/pg_cluster.rs"]
mod pg_cluster;

use pg_cluster::{fresh_database_url, handle_cluster_setup_failure};

const PASSWORD: &str = "correct-horse-battery";

type Accounts = AccountsService<DieselUserRepository, Argon2PasswordHasher>;
type Posts = PostsService<DieselPostRepository, DieselCategoryRepository, DieselUserRepository>;
type Categories =
    CategoriesService<DieselCategoryRepository, DieselPostRepository, DieselUserRepository>;
type Notifications =
    NotificationService<DieselPostRepository, DieselCategoryRepository, RecordingMailer>;

struct DieselStack {
    runtime: Runtime,
    database_url: String,
    accounts: Accounts,
    posts: Posts,
    categories: Categories,
    notifications: Notifications,
    mailer: Arc<RecordingMailer>,
    receiver: mpsc::Receiver<QueuedTask>,
}

impl DieselStack {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn reader(&self, username: &str) -> User {
        let registration =
            Registration::try_from_parts(username, &format!("{username}@paper.test"), PASSWORD)
                .expect("valid registration");
        self.block_on(self.accounts.signup(registration))
            .expect("signup succeeds")
    }

    fn author(&self, username: &str) -> User {
        let user = self.reader(username);
        self.block_on(self.accounts.become_author(user.id()))
            .expect("promotion succeeds")
    }

    fn category(&self, title: &str) -> Category {
        let title = CategoryTitle::new(title).expect("valid title");
        self.block_on(self.categories.create(title))
            .expect("category created")
    }

    fn publish(&self, author: &User, title: &str, category: &Category) -> Post {
        let draft = PostDraft::try_from_parts(
            title,
            &format!("{title} in full, long enough to be trimmed in previews."),
            &[category.id.get()],
        )
        .expect("valid draft");
        self.block_on(self.posts.create(author.id(), PostKind::News, draft))
            .expect("post created")
    }
}

fn setup_stack() -> Result<DieselStack, String> {
    let database_url = fresh_database_url()?;
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    runtime
        .block_on(run_pending_migrations(&database_url))
        .map_err(|err| err.to_string())?;
    let pool = runtime
        .block_on(DbPool::new(
            PoolConfig::new(&database_url)
                .with_max_size(4)
                .with_min_idle(Some(1)),
        ))
        .map_err(|err| err.to_string())?;

    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let posts = Arc::new(DieselPostRepository::new(pool.clone()));
    let categories = Arc::new(DieselCategoryRepository::new(pool));
    let clock = Arc::new(DefaultClock);
    let mailer = Arc::new(RecordingMailer::new());
    let (queue, receiver) = InProcessTaskQueue::channel(16);
    let site = SiteUrl::parse("http://paper.test").map_err(|err| err.to_string())?;

    Ok(DieselStack {
        accounts: AccountsService::new(
            users.clone(),
            Arc::new(Argon2PasswordHasher::new()),
            clock.clone(),
        ),
        posts: PostsService::new(
            PostsServiceDeps {
                posts: posts.clone(),
                categories: categories.clone(),
                users: users.clone(),
                queue: Arc::new(queue),
                clock: clock.clone(),
            },
            DailyPostLimit::default(),
        ),
        categories: CategoriesService::new(categories.clone(), posts.clone(), users),
        notifications: NotificationService::new(posts, categories, mailer.clone(), clock, site),
        mailer,
        receiver,
        runtime,
        database_url,
    })
}

#[fixture]
fn stack() -> Option<DieselStack> {
    match setup_stack() {
        Ok(stack) => Some(stack),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn migrations_apply_once(stack: Option<DieselStack>) {
    let Some(stack) = stack else { return };
    let applied = stack
        .block_on(run_pending_migrations(&stack.database_url))
        .expect("rerun succeeds");
    assert_eq!(applied, 0);
}

#[rstest]
fn accounts_round_trip_through_postgres(stack: Option<DieselStack>) {
    let Some(stack) = stack else { return };
    let ann = stack.reader("ann");
    assert!(!ann.is_author());

    let credentials = LoginCredentials::try_from_parts("ann", PASSWORD).expect("credentials");
    let logged_in = stack
        .block_on(stack.accounts.login(&credentials))
        .expect("login succeeds");
    assert_eq!(&logged_in, ann.id());

    let wrong = LoginCredentials::try_from_parts("ann", "not-the-password").expect("credentials");
    let err = stack
        .block_on(stack.accounts.login(&wrong))
        .expect_err("wrong password rejected");
    assert_eq!(err.code(), ErrorCode::Unauthorized);

    stack
        .block_on(stack.accounts.become_author(ann.id()))
        .expect("promotion succeeds");
    stack
        .block_on(stack.accounts.become_author(ann.id()))
        .expect("promotion is idempotent");
    let profile = stack
        .block_on(stack.accounts.profile(ann.id()))
        .expect("profile");
    assert!(profile.is_author());
}

#[rstest]
fn duplicate_usernames_and_titles_conflict(stack: Option<DieselStack>) {
    let Some(stack) = stack else { return };
    stack.reader("ann");
    let again = Registration::try_from_parts("ann", "other@paper.test", PASSWORD)
        .expect("valid registration");
    let err = stack
        .block_on(stack.accounts.signup(again))
        .expect_err("duplicate username");
    assert_eq!(err.code(), ErrorCode::Conflict);

    stack.category("Science");
    let err = stack
        .block_on(
            stack
                .categories
                .create(CategoryTitle::new("Science").expect("valid title")),
        )
        .expect_err("duplicate title");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
fn posts_list_search_rate_and_delete(stack: Option<DieselStack>) {
    let Some(stack) = stack else { return };
    let ann = stack.author("ann");
    let bob = stack.reader("bob");
    let science = stack.category("Science");
    let older = stack.publish(&ann, "Mars landing", &science);
    let newer = stack.publish(&ann, "Lunar eclipse", &science);

    let page = stack
        .block_on(stack.posts.list(PageRequest::first()))
        .expect("first page");
    assert_eq!(page.total, 2);
    let ids: Vec<_> = page.posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(page.posts[0].categories[0].title, science.title);

    let filter = SearchFilter::try_from_parts(Some("MARS"), Some("an"), None).expect("filter");
    let found = stack
        .block_on(stack.posts.search(&filter))
        .expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, older.id);

    for change in [RatingChange::Like, RatingChange::Like, RatingChange::Dislike] {
        stack
            .block_on(stack.posts.rate(bob.id(), older.id, change))
            .expect("rating applied");
    }
    let rated = stack
        .block_on(stack.posts.detail(older.id))
        .expect("detail");
    assert_eq!(rated.rating, 1);

    stack
        .block_on(stack.posts.delete(ann.id(), newer.id))
        .expect("delete succeeds");
    let err = stack
        .block_on(stack.posts.detail(newer.id))
        .expect_err("deleted post is gone");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
fn daily_limit_counts_stored_posts(stack: Option<DieselStack>) {
    let Some(stack) = stack else { return };
    let ann = stack.author("ann");
    let science = stack.category("Science");
    for title in ["One", "Two", "Three"] {
        stack.publish(&ann, title, &science);
    }
    let draft = PostDraft::try_from_parts("Four", "Over the limit.", &[science.id.get()])
        .expect("valid draft");
    let err = stack
        .block_on(stack.posts.create(ann.id(), PostKind::Article, draft))
        .expect_err("limit reached");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "You can't post more than 3 posts per day!");
}

#[rstest]
fn concurrent_posts_cannot_overrun_the_daily_limit(stack: Option<DieselStack>) {
    let Some(stack) = stack else { return };
    let ann = stack.author("ann");
    let science = stack.category("Science");
    stack.publish(&ann, "One", &science);
    stack.publish(&ann, "Two", &science);

    let drafts = ["Three", "Four", "Five"].map(|title| {
        PostDraft::try_from_parts(title, "Racing for the last slot.", &[science.id.get()])
            .expect("valid draft")
    });
    let results = stack.block_on(join_all(
        drafts
            .into_iter()
            .map(|draft| stack.posts.create(ann.id(), PostKind::News, draft)),
    ));

    let (created, rejected): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    assert_eq!(created.len(), 1);
    for err in rejected.into_iter().filter_map(Result::err) {
        assert_eq!(err.message(), "You can't post more than 3 posts per day!");
    }
}

#[rstest]
fn subscriptions_drive_notifications_and_digest(stack: Option<DieselStack>) {
    let Some(mut stack) = stack else { return };
    let ann = stack.author("ann");
    let bob = stack.reader("bob");
    let science = stack.category("Science");
    let politics = stack.category("Politics");

    let state = stack
        .block_on(stack.categories.toggle_subscription(bob.id(), science.id))
        .expect("subscribe");
    assert!(state.subscribed);
    let detail = stack
        .block_on(stack.categories.detail(science.id, Some(bob.id().clone())))
        .expect("detail");
    assert!(detail.subscribed);
    assert_eq!(detail.category.subscriber_count, 1);

    let post = stack.publish(&ann, "Eclipse tonight", &science);
    stack.publish(&ann, "Budget vote", &politics);

    let queued = stack.receiver.try_recv().expect("notification queued");
    assert_eq!(queued.task, Task::NotifySubscribers { post_id: post.id });
    let report = stack
        .block_on(stack.notifications.notify_subscribers(post.id))
        .expect("notification sent");
    assert_eq!(report.emails_sent, 1);

    let report = stack
        .block_on(stack.notifications.send_weekly_digest())
        .expect("digest sent");
    assert_eq!(report.emails_sent, 1);

    let sent = stack.mailer.sent();
    let subjects: Vec<_> = sent.iter().map(|message| message.subject.as_str()).collect();
    assert_eq!(subjects, vec!["New article in category Science", "Weekly digest"]);
    assert!(sent.iter().all(|message| message.to.as_ref() == "bob@paper.test"));
    assert!(sent[1].body.contains("Eclipse tonight: http://paper.test/api/v1/news/"));
    assert!(!sent[1].body.contains("Budget vote"));

    let state = stack
        .block_on(stack.categories.toggle_subscription(bob.id(), science.id))
        .expect("unsubscribe");
    assert!(!state.subscribed);

    let categories = stack
        .block_on(stack.categories.list())
        .expect("categories");
    let titles: Vec<_> = categories
        .iter()
        .map(|category| category.title.to_string())
        .collect();
    assert_eq!(titles, vec!["Politics".to_owned(), "Science".to_owned()]);
}
