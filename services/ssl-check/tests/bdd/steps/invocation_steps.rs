//! BDD step definitions for the check invocation feature

use std::sync::Arc;

use cucumber::{given, then, when};
use serde_json::json;

use ssl_check::io::RequestBody;
use ssl_check::{Config, InvocationContext, InvocationEvent, SslCheckBuilder};

use super::doubles::{envelope, FakeUptimeRobot, RecordingProber, WEBHOOK_URL};
use crate::world::SslCheckWorld;

fn parse_status(s: &str) -> u8 {
    match s {
        "paused" => 0,
        "not checked yet" => 1,
        "up" => 2,
        "seems down" => 8,
        "down" => 9,
        other => panic!("Unknown monitor status: {}", other),
    }
}

async fn run_check(world: &mut SslCheckWorld, event: InvocationEvent) {
    let monitors = match &world.api_failure {
        Some(message) => json!({"stat": "fail", "error": {"message": message}}),
        None => envelope("monitors", &world.monitors),
    };
    let http = Arc::new(FakeUptimeRobot::new(
        monitors,
        envelope("alert_contacts", &world.contacts),
        world.webhook_status.unwrap_or(200),
    ));
    let prober = Arc::new(RecordingProber::new(world.failing_hosts.clone()));

    let check = SslCheckBuilder::new(Config::default())
        .with_http_client(http.clone())
        .with_prober(prober.clone())
        .build()
        .expect("check should build");
    let context = InvocationContext {
        log_group_name: Some("/aws/lambda/ssl-check".to_string()),
        log_stream_name: Some("2024/03/01/[$LATEST]abc".to_string()),
        region: "eu-west-1".to_string(),
    };

    world.result = Some(check.handle(&event, &context).await);
    world.http = Some(http);
    world.prober = Some(prober);
}

fn http(world: &SslCheckWorld) -> &FakeUptimeRobot {
    world.http.as_deref().expect("check has not run")
}

fn prober(world: &SslCheckWorld) -> &RecordingProber {
    world.prober.as_deref().expect("check has not run")
}

fn error_message(world: &SslCheckWorld) -> String {
    match world.result.as_ref().expect("check has not run") {
        Ok(response) => panic!("Expected a failure, got {:?}", response),
        Err(e) => e.to_string(),
    }
}

#[given(expr = "a monitor {string} at {string} that is {string}")]
fn monitor(world: &mut SslCheckWorld, name: String, url: String, status: String) {
    let id = world.monitors.len() + 1;
    world.monitors.push(json!({
        "id": id,
        "friendly_name": name,
        "url": url,
        "status": parse_status(&status),
    }));
}

#[given("the account has an email alert contact")]
fn email_contact(world: &mut SslCheckWorld) {
    world
        .contacts
        .push(json!({"id": "1", "type": 2, "value": "ops@example.com"}));
}

#[given("the account has a Slack webhook alert contact")]
fn slack_contact(world: &mut SslCheckWorld) {
    world
        .contacts
        .push(json!({"id": "2", "type": 11, "value": WEBHOOK_URL}));
}

#[given(expr = "the monitor API rejects the key with {string}")]
fn api_rejects(world: &mut SslCheckWorld, message: String) {
    world.api_failure = Some(message);
}

#[given(expr = "the TLS handshake fails for {string}")]
fn handshake_fails(world: &mut SslCheckWorld, host: String) {
    world.failing_hosts.push(host);
}

#[given(expr = "the Slack webhook responds with status {int}")]
fn webhook_status(world: &mut SslCheckWorld, status: u16) {
    world.webhook_status = Some(status);
}

#[when(expr = "the check runs with API key {string}")]
async fn run_with_key(world: &mut SslCheckWorld, api_key: String) {
    run_check(world, InvocationEvent::with_api_key(api_key)).await;
}

#[when("the check runs without an API key")]
async fn run_without_key(world: &mut SslCheckWorld) {
    run_check(world, InvocationEvent::default()).await;
}

#[then(expr = "the invocation succeeds with status {int}")]
fn succeeds(world: &mut SslCheckWorld, status: u16) {
    match world.result.as_ref().expect("check has not run") {
        Ok(response) => {
            assert_eq!(response.status_code, status);
            assert_eq!(response.body, r#"{"status":"OK"}"#);
        }
        Err(e) => panic!("Expected success, got error: {}", e),
    }
}

#[then(expr = "the invocation fails with message {string}")]
fn fails_with(world: &mut SslCheckWorld, message: String) {
    assert_eq!(error_message(world), message);
}

#[then(expr = "the invocation error mentions {string}")]
fn error_mentions(world: &mut SslCheckWorld, fragment: String) {
    let message = error_message(world);
    assert!(
        message.contains(&fragment),
        "Expected error to mention '{}', got '{}'",
        fragment,
        message
    );
}

#[then(expr = "the probed hosts are {string}")]
fn probed_hosts(world: &mut SslCheckWorld, hosts: String) {
    let mut expected: Vec<String> = hosts.split(',').map(|h| h.trim().to_string()).collect();
    expected.sort();
    assert_eq!(prober(world).probed_hosts(), expected);
}

#[then("no hosts are probed")]
fn no_hosts_probed(world: &mut SslCheckWorld) {
    assert!(prober(world).probed_hosts().is_empty());
}

#[then("no HTTP requests are made")]
fn no_requests(world: &mut SslCheckWorld) {
    assert!(http(world).requests().is_empty());
}

#[then("no webhook request is sent")]
fn no_webhook(world: &mut SslCheckWorld) {
    assert!(http(world).webhook_requests().is_empty());
}

#[then(expr = "one webhook request is sent whose text is {string}")]
fn webhook_text(world: &mut SslCheckWorld, text: String) {
    let requests = http(world).webhook_requests();
    assert_eq!(requests.len(), 1);

    let Some(RequestBody::Json(body)) = &requests[0].body else {
        panic!("Expected a JSON webhook body, got {:?}", requests[0].body);
    };
    assert_eq!(body["text"], text.replace("\\n", "\n"));
}

#[then(expr = "the webhook message links to the log stream")]
fn webhook_links_log(world: &mut SslCheckWorld) {
    let requests = http(world).webhook_requests();
    let Some(RequestBody::Json(body)) = &requests[0].body else {
        panic!("Expected a JSON webhook body");
    };
    let blocks = body["blocks"].as_array().expect("blocks array");
    let last = blocks.last().expect("at least one block");

    assert_eq!(last["text"]["type"], "mrkdwn");
    let link = last["text"]["text"].as_str().expect("link text");
    assert!(link.starts_with("<https://eu-west-1.console.aws.amazon.com/cloudwatch/home"));
    assert!(link.contains("%2Faws%2Flambda%2Fssl-check"));
    assert!(link.ends_with("|Open log for details>"));
}

#[then(expr = "the webhook message has {int} dividers")]
fn webhook_dividers(world: &mut SslCheckWorld, count: usize) {
    let requests = http(world).webhook_requests();
    let Some(RequestBody::Json(body)) = &requests[0].body else {
        panic!("Expected a JSON webhook body");
    };
    let dividers = body["blocks"]
        .as_array()
        .expect("blocks array")
        .iter()
        .filter(|block| block["type"] == "divider")
        .count();
    assert_eq!(dividers, count);
}
