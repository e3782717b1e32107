//! BDD test world for ssl-check

use std::sync::Arc;

use cucumber::World;
use serde_json::Value;
use ssl_check::InvocationResponse;

use crate::steps::doubles::{FakeUptimeRobot, RecordingProber};

#[derive(Debug, Default, World)]
pub struct SslCheckWorld {
    // Account state served by the fake API
    pub monitors: Vec<Value>,
    pub contacts: Vec<Value>,
    pub api_failure: Option<String>,
    pub webhook_status: Option<u16>,

    // Probe behaviour
    pub failing_hosts: Vec<String>,

    // Recorded after the check ran
    pub http: Option<Arc<FakeUptimeRobot>>,
    pub prober: Option<Arc<RecordingProber>>,
    pub result: Option<ssl_check::Result<InvocationResponse>>,
}
