//! Server harness and shared world for newspaper behaviour suites.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. The server runs the real services over
//! the in-memory store; queued tasks only run when a step drains them. The
//! `WorldFixture` ensures the server is stopped even if a test panics.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::TcpListener;
use std::rc::Rc;

use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::http::{Method, header};
use actix_web::{App, HttpServer, web};
use awc::Client;
use newspaper::Trace;
use newspaper::domain::TRACE_ID_HEADER;
use newspaper::inbound::http::api_services;
use newspaper::inbound::http::session_config::SessionSettings;
use newspaper::inbound::http::state::HttpState;
use newspaper::outbound::queue::TaskOutcome;
use newspaper::test_support::MemoryStack;
use rstest::fixture;
use serde_json::Value;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

pub(crate) const PASSWORD: &str = "correct-horse-battery";

pub(crate) struct NewspaperWorld {
    pub(crate) runtime: Runtime,
    pub(crate) local: LocalSet,
    pub(crate) base_url: String,
    pub(crate) server: ServerHandle,
    pub(crate) stack: MemoryStack,
    /// Session cookie pair (`session=...`) per username.
    pub(crate) sessions: HashMap<String, String>,
    /// Category ids by title.
    pub(crate) categories: HashMap<String, i64>,
    /// Post ids by title, recorded when a step publishes.
    pub(crate) posts: HashMap<String, i64>,
    pub(crate) last_status: Option<u16>,
    pub(crate) last_body: Option<Value>,
    pub(crate) last_location: Option<String>,
    pub(crate) last_trace_id: Option<String>,
    pub(crate) last_outcomes: Vec<TaskOutcome>,
}

pub(crate) type SharedWorld = Rc<RefCell<NewspaperWorld>>;

pub(crate) struct WorldFixture {
    world: SharedWorld,
}

impl WorldFixture {
    pub(crate) fn world(&self) -> SharedWorld {
        self.world.clone()
    }
}

impl Drop for WorldFixture {
    fn drop(&mut self) {
        shutdown(self.world.clone());
    }
}

pub(crate) fn shutdown(world: SharedWorld) {
    // `LocalSet` must be driven on the thread that owns it, so we lock the world
    // while calling `block_on`. The future must not try to lock the world.
    let ctx = world.borrow();
    let server = ctx.server.clone();
    ctx.local.block_on(&ctx.runtime, async move {
        server.stop(true).await;
    });
}

pub(crate) fn with_world_async<R, F>(world: &SharedWorld, operation: impl FnOnce(String) -> F) -> R
where
    F: std::future::Future<Output = R>,
{
    let ctx = world.borrow();
    let base_url = ctx.base_url.clone();
    ctx.local.block_on(&ctx.runtime, operation(base_url))
}

fn spawn_server(http_state: web::Data<HttpState>) -> Result<(String, ServerHandle), String> {
    let session = SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    };
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(http_state.clone())
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session.middleware())
                    .configure(api_services),
            )
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    Ok((format!("http://{addr}"), handle))
}

#[fixture]
pub(crate) fn world() -> WorldFixture {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();
    let stack = MemoryStack::new().expect("memory stack");
    let (base_url, server) = local
        .block_on(&runtime, async { spawn_server(stack.http_state.clone()) })
        .expect("spawn server");

    WorldFixture {
        world: Rc::new(RefCell::new(NewspaperWorld {
            runtime,
            local,
            base_url,
            server,
            stack,
            sessions: HashMap::new(),
            categories: HashMap::new(),
            posts: HashMap::new(),
            last_status: None,
            last_body: None,
            last_location: None,
            last_trace_id: None,
            last_outcomes: Vec::new(),
        })),
    }
}

/// One HTTP call issued by a step.
pub(crate) struct RequestSpec<'a> {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) payload: Option<Value>,
    /// Send this user's session cookie.
    pub(crate) as_user: Option<&'a str>,
    pub(crate) referer: Option<&'a str>,
}

impl<'a> RequestSpec<'a> {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: None,
            as_user: None,
            referer: None,
        }
    }

    pub(crate) fn json(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub(crate) fn as_user(mut self, username: &'a str) -> Self {
        self.as_user = Some(username);
        self
    }

    pub(crate) fn referer(mut self, referer: &'a str) -> Self {
        self.referer = Some(referer);
        self
    }
}

struct Recorded {
    status: u16,
    body: Option<Value>,
    location: Option<String>,
    trace_id: Option<String>,
    cookie: Option<String>,
}

fn header_value(headers: &actix_web::http::header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Issue the request, record the response, and return any session cookie set.
pub(crate) fn perform(world: &SharedWorld, spec: RequestSpec<'_>) -> Option<String> {
    let RequestSpec {
        method,
        path,
        payload,
        as_user,
        referer,
    } = spec;
    let cookie = as_user.map(|username| {
        world
            .borrow()
            .sessions
            .get(username)
            .cloned()
            .unwrap_or_else(|| panic!("{username} has no session"))
    });
    let referer = referer.map(str::to_owned);

    let recorded = with_world_async(world, |base_url| async move {
        let client = Client::builder().disable_redirects().finish();
        let mut request = client.request(method, format!("{base_url}{path}"));
        if let Some(cookie) = cookie {
            request = request.insert_header((header::COOKIE, cookie));
        }
        if let Some(referer) = referer {
            request = request.insert_header((header::REFERER, referer));
        }
        let mut response = match payload {
            Some(payload) => request.send_json(&payload).await.expect("request sent"),
            None => request.send().await.expect("request sent"),
        };
        let headers = response.headers().clone();
        let bytes = response.body().await.expect("response body");
        Recorded {
            status: response.status().as_u16(),
            body: (!bytes.is_empty())
                .then(|| serde_json::from_slice(&bytes).expect("JSON body")),
            location: header_value(&headers, header::LOCATION.as_str()),
            trace_id: header_value(&headers, TRACE_ID_HEADER),
            cookie: header_value(&headers, header::SET_COOKIE.as_str())
                .and_then(|raw| raw.split(';').next().map(str::to_owned)),
        }
    });

    let mut ctx = world.borrow_mut();
    ctx.last_status = Some(recorded.status);
    ctx.last_body = recorded.body;
    ctx.last_location = recorded.location;
    ctx.last_trace_id = recorded.trace_id;
    recorded.cookie
}

pub(crate) fn sign_up(world: &SharedWorld, username: &str) {
    perform(
        world,
        RequestSpec::new(Method::POST, "/api/v1/signup").json(serde_json::json!({
            "username": username,
            "email": format!("{username}@paper.test"),
            "password": PASSWORD,
        })),
    );
}

pub(crate) fn log_in(world: &SharedWorld, username: &str, password: &str) {
    let cookie = perform(
        world,
        RequestSpec::new(Method::POST, "/api/v1/login").json(serde_json::json!({
            "username": username,
            "password": password,
        })),
    );
    if let Some(cookie) = cookie {
        world.borrow_mut().sessions.insert(username.to_owned(), cookie);
    }
}

pub(crate) fn create_category(world: &SharedWorld, title: &str) -> i64 {
    let category = {
        let ctx = world.borrow();
        ctx.local
            .block_on(&ctx.runtime, ctx.stack.create_category(title))
            .expect("category created")
    };
    let id = category.id.get();
    world.borrow_mut().categories.insert(title.to_owned(), id);
    id
}

pub(crate) fn category_id(world: &SharedWorld, title: &str) -> i64 {
    *world
        .borrow()
        .categories
        .get(title)
        .unwrap_or_else(|| panic!("category {title} exists"))
}

/// Publish through the HTTP API, remembering the post id on success.
pub(crate) fn publish(world: &SharedWorld, author: &str, kind: &str, title: &str, category: &str) {
    let category = category_id(world, category);
    let path = match kind {
        "news" => "/api/v1/news",
        "article" => "/api/v1/articles",
        other => panic!("unknown post kind {other}"),
    };
    perform(
        world,
        RequestSpec::new(Method::POST, path)
            .json(serde_json::json!({
                "title": title,
                "content": format!("{title} in full, with enough words to need an excerpt."),
                "categories": [category],
            }))
            .as_user(author),
    );
    let id = {
        let ctx = world.borrow();
        match ctx.last_status {
            Some(201) => ctx
                .last_body
                .as_ref()
                .and_then(|body| body.get("id"))
                .and_then(Value::as_i64),
            _ => None,
        }
    };
    if let Some(id) = id {
        world.borrow_mut().posts.insert(title.to_owned(), id);
    }
}

pub(crate) fn post_id(world: &SharedWorld, title: &str) -> i64 {
    *world
        .borrow()
        .posts
        .get(title)
        .unwrap_or_else(|| panic!("post {title} was published"))
}

pub(crate) fn run_pending_tasks(world: &SharedWorld) {
    let mut guard = world.borrow_mut();
    let ctx = &mut *guard;
    let outcomes = ctx.local.block_on(&ctx.runtime, ctx.stack.run_pending_tasks());
    ctx.last_outcomes = outcomes;
}

pub(crate) fn last_status(world: &SharedWorld) -> u16 {
    world.borrow().last_status.expect("a request was sent")
}

pub(crate) fn last_body(world: &SharedWorld) -> Value {
    world.borrow().last_body.clone().expect("response body")
}

/// Step placeholders may arrive with surrounding quotes.
pub(crate) fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}
