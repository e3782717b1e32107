//! Hand-written HTTP and probe doubles shared by the step definitions

use std::sync::Mutex;

use serde_json::{json, Value};
use ssl_check::io::{classify, HttpClient, HttpRequest, HttpResponse, ResponseBody};
use ssl_check::monitor::ProbeTarget;
use ssl_check::probe::{ProbeError, ProbeOutcome, Prober};

pub const WEBHOOK_URL: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

/// Serves the monitor API from canned JSON and accepts webhook posts
#[derive(Debug, Default)]
pub struct FakeUptimeRobot {
    pub monitors: Value,
    pub contacts: Value,
    pub webhook_status: u16,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeUptimeRobot {
    pub fn new(monitors: Value, contacts: Value, webhook_status: u16) -> Self {
        Self {
            monitors,
            contacts,
            webhook_status,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn webhook_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|req| req.url == WEBHOOK_URL)
            .collect()
    }
}

fn json_ok(body: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        reason: "OK".to_string(),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: ResponseBody::Json(body),
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeUptimeRobot {
    async fn request(&self, request: HttpRequest) -> ssl_check::Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if request.url.ends_with("/getMonitors") {
            return Ok(json_ok(self.monitors.clone()));
        }
        if request.url.ends_with("/getAlertContacts") {
            return Ok(json_ok(self.contacts.clone()));
        }
        if request.url == WEBHOOK_URL {
            let (reason, body) = if self.webhook_status < 400 {
                ("OK", "ok")
            } else {
                ("Bad Request", "invalid_payload")
            };
            return classify(HttpResponse {
                status: self.webhook_status,
                reason: reason.to_string(),
                headers: vec![("content-type".to_string(), "text/html".to_string())],
                body: ResponseBody::Text(body.to_string()),
            });
        }

        classify(HttpResponse {
            status: 404,
            reason: "Not Found".to_string(),
            headers: vec![],
            body: ResponseBody::Text(String::new()),
        })
    }
}

/// Records every probed host; hosts listed in `failing_hosts` fail the handshake
#[derive(Debug, Default)]
pub struct RecordingProber {
    failing_hosts: Vec<String>,
    probed: Mutex<Vec<String>>,
}

impl RecordingProber {
    pub fn new(failing_hosts: Vec<String>) -> Self {
        Self {
            failing_hosts,
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed_hosts(&self) -> Vec<String> {
        let mut hosts = self.probed.lock().unwrap().clone();
        hosts.sort();
        hosts
    }
}

#[async_trait::async_trait]
impl Prober for RecordingProber {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        self.probed.lock().unwrap().push(target.host.clone());

        if self.failing_hosts.contains(&target.host) {
            ProbeOutcome::Failure(ProbeError::Handshake {
                target: target.to_string(),
                reason: "certificate has expired".to_string(),
            })
        } else {
            ProbeOutcome::Success
        }
    }
}

/// `{"stat": "ok", <key>: [items]}`
pub fn envelope(key: &str, items: &[Value]) -> Value {
    let mut body = json!({ "stat": "ok" });
    body[key] = Value::Array(items.to_vec());
    body
}
