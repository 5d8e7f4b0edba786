//! Behavioural tests for the daemon request protocol.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use super::support::{self, FailingConfigLoader, HealthEvent, TestWorld, limited_config};
use crate::bootstrap::StaticConfigLoader;

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a daemon accepting requests of up to {limit} bytes")]
fn given_request_limit(world: &RefCell<TestWorld>, limit: usize) {
    world
        .borrow_mut()
        .use_loader(StaticConfigLoader::new(limited_config(limit, 4)));
}

#[given("a daemon whose job queue holds {capacity} job")]
fn given_queue_capacity(world: &RefCell<TestWorld>, capacity: usize) {
    world
        .borrow_mut()
        .use_loader(StaticConfigLoader::new(limited_config(4096, capacity)));
}

#[given("a configuration that cannot be loaded")]
fn given_failing_loader(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_loader(FailingConfigLoader);
}

#[given("a request to encode {data} with the {plugin} encoder")]
fn given_encode_request(world: &RefCell<TestWorld>, data: String, plugin: String) {
    let request = serde_json::json!({
        "op": "encode",
        "plugin": unquote(&plugin),
        "form": { "data": unquote(&data) },
    });
    world.borrow_mut().push_line(&request.to_string());
}

#[given("a request padded to {size} bytes")]
fn given_padded_request(world: &RefCell<TestWorld>, size: usize) {
    let prefix = r#"{"op":"list","pad":""#;
    let padding = "x".repeat(size.saturating_sub(prefix.len() + 2));
    world
        .borrow_mut()
        .push_line(&format!("{prefix}{padding}\"}}"));
}

#[given("a line that is not JSON")]
fn given_malformed_line(world: &RefCell<TestWorld>) {
    world.borrow_mut().push_line("show me the payloads");
}

#[given("a request to update the repository {name}")]
fn given_update_request(world: &RefCell<TestWorld>, name: String) {
    let request = serde_json::json!({
        "op": "enqueue",
        "job": "update_repo",
        "form": { "name": unquote(&name) },
    });
    world.borrow_mut().push_line(&request.to_string());
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the daemon serves the requests")]
fn when_served(world: &RefCell<TestWorld>) {
    world.borrow_mut().serve();
}

#[when("the daemon bootstraps")]
fn when_bootstraps(world: &RefCell<TestWorld>) {
    world.borrow_mut().bootstrap();
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("reply {position} has status {status}")]
fn then_reply_status(world: &RefCell<TestWorld>, position: usize, status: u64) {
    let world = world.borrow();
    let reply = world.reply(position);
    assert_eq!(reply["status"].as_u64(), Some(status), "reply: {reply}");
}

#[then("reply {position} reports the error {kind}")]
fn then_reply_error(world: &RefCell<TestWorld>, position: usize, kind: String) {
    let world = world.borrow();
    let reply = world.reply(position);
    assert_eq!(reply["body"]["error"].as_str(), Some(unquote(&kind)), "reply: {reply}");
}

#[then("reply {position} carries the text {text}")]
fn then_reply_text(world: &RefCell<TestWorld>, position: usize, text: String) {
    let world = world.borrow();
    let reply = world.reply(position);
    assert_eq!(
        reply["body"]["artifact"]["text"].as_str(),
        Some(unquote(&text)),
        "reply: {reply}"
    );
}

#[then("{count} requests were answered")]
fn then_requests_answered(world: &RefCell<TestWorld>, count: usize) {
    assert_eq!(world.borrow().summary().requests, count);
}

#[then("the job queue holds {count} job")]
fn then_queue_len(world: &RefCell<TestWorld>, count: usize) {
    assert_eq!(world.borrow().daemon().queue().len(), count);
}

#[then("the reporter recorded the finished session")]
fn then_session_reported(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let expected = HealthEvent::SessionFinished(world.summary());
    assert_eq!(world.reporter.events().last(), Some(&expected));
}

#[then("bootstrap fails")]
fn then_bootstrap_fails(world: &RefCell<TestWorld>) {
    assert!(
        world.borrow().bootstrap_error().is_some(),
        "bootstrap succeeded unexpectedly"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_failure_reported(world: &RefCell<TestWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events
        .iter()
        .any(|event| matches!(event, HealthEvent::BootstrapFailed(_)));
    assert!(failed, "bootstrap failure event missing: {events:?}");
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/daemon_protocol.feature",
    name = "Encoding a string over the request stream"
)]
fn encoding_over_the_stream(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/daemon_protocol.feature",
    name = "An oversized request is refused and the stream continues"
)]
fn oversized_request(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/daemon_protocol.feature",
    name = "A malformed line is answered and the stream continues"
)]
fn malformed_line(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/daemon_protocol.feature",
    name = "Jobs are accepted until the queue is full"
)]
fn queue_fills(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/daemon_protocol.feature",
    name = "An unloadable configuration stops the daemon"
)]
fn unloadable_configuration(world: RefCell<TestWorld>) {
    let _ = world;
}
