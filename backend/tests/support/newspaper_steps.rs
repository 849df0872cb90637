//! Steps shared by every newspaper behaviour suite.
//!
//! Suites include this module next to the harness; it registers the
//! background and status steps so feature files can share their wording.

use actix_web::http::Method;
use rstest_bdd_macros::{given, then, when};
use serde_json::Value;

use crate::harness::{
    PASSWORD, RequestSpec, WorldFixture, create_category, last_body, last_status, log_in, perform,
    publish, sign_up, unquote,
};

#[given("a running newspaper server")]
fn a_running_newspaper_server(world: &WorldFixture) {
    let ctx = world.world();
    assert!(ctx.borrow().base_url.starts_with("http://127.0.0.1:"));
}

#[given("a category {title}")]
fn a_category(world: &WorldFixture, title: String) {
    create_category(&world.world(), unquote(&title));
}

#[given("a registered reader {username}")]
fn a_registered_reader(world: &WorldFixture, username: String) {
    let world = world.world();
    sign_up(&world, unquote(&username));
    assert_eq!(last_status(&world), 201);
}

#[given("a signed-in reader {username}")]
fn a_signed_in_reader(world: &WorldFixture, username: String) {
    let world = world.world();
    let username = unquote(&username);
    sign_up(&world, username);
    log_in(&world, username, PASSWORD);
    assert_eq!(last_status(&world), 200);
}

#[given("an author {username}")]
fn an_author(world: &WorldFixture, username: String) {
    let world = world.world();
    let username = unquote(&username);
    sign_up(&world, username);
    log_in(&world, username, PASSWORD);
    perform(
        &world,
        RequestSpec::new(Method::POST, "/api/v1/become-author").as_user(username),
    );
    assert_eq!(last_status(&world), 303);
}

#[given("{username} has published news {title} in {category}")]
fn has_published_news(world: &WorldFixture, username: String, title: String, category: String) {
    let world = world.world();
    publish(
        &world,
        unquote(&username),
        "news",
        unquote(&title),
        unquote(&category),
    );
    assert_eq!(last_status(&world), 201);
}

#[when("{username} follows the Location header")]
fn follows_the_location_header(world: &WorldFixture, username: String) {
    let world = world.world();
    let location = world
        .borrow()
        .last_location
        .clone()
        .expect("response carried a Location header");
    perform(
        &world,
        RequestSpec::new(Method::GET, location).as_user(unquote(&username)),
    );
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &WorldFixture, status: u16) {
    assert_eq!(last_status(&world.world()), status);
}

#[then("the response redirects to {location}")]
fn the_response_redirects_to(world: &WorldFixture, location: String) {
    let ctx = world.world();
    let ctx = ctx.borrow();
    assert_eq!(ctx.last_status, Some(303));
    assert_eq!(ctx.last_location.as_deref(), Some(unquote(&location)));
}

#[then("the error code is {code}")]
fn the_error_code_is(world: &WorldFixture, code: String) {
    let body = last_body(&world.world());
    assert_eq!(body.get("code").and_then(Value::as_str), Some(unquote(&code)));
}

#[then("the error message is {message}")]
fn the_error_message_is(world: &WorldFixture, message: String) {
    let body = last_body(&world.world());
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some(unquote(&message))
    );
}

#[then("the error carries the response trace id")]
fn the_error_carries_the_response_trace_id(world: &WorldFixture) {
    let ctx = world.world();
    let ctx = ctx.borrow();
    let trace_id = ctx.last_trace_id.as_deref().expect("trace id header");
    let body = ctx.last_body.as_ref().expect("error body");
    assert_eq!(body.get("traceId").and_then(Value::as_str), Some(trace_id));
}
