//! Configuration types for the ssl-check service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Region used for the diagnostics link when none is configured
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub uptime_robot: UptimeRobotConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub region: Option<String>,
}

/// Monitoring API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeRobotConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Substring identifying the Slack webhook among the alert contacts
    #[serde(default = "default_webhook_host_marker")]
    pub webhook_host_marker: String,
}

impl Default for UptimeRobotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            webhook_host_marker: default_webhook_host_marker(),
        }
    }
}

/// Outbound request settings, shared by API calls, webhook sends and TLS probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// How much detail to log for responses and probe failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn is_verbose(self) -> bool {
        self == Verbosity::Verbose
    }
}

impl Config {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> crate::Result<()> {
        if self.http.timeout_seconds == 0 {
            return Err(crate::SslCheckError::Config(
                "http.timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlay settings from the environment (`LOG_VERBOSE`, `AWS_REGION`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("LOG_VERBOSE").as_deref() == Some("1") {
            self.verbose = true;
        }
        if let Some(region) = lookup("AWS_REGION").filter(|r| !r.is_empty()) {
            self.region = Some(region);
        }
    }
}

fn default_base_url() -> String {
    "https://api.uptimerobot.com/v2".to_string()
}

fn default_webhook_host_marker() -> String {
    "hooks.slack.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::SslCheckError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
