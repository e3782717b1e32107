//! Monitor records and the TLS targets derived from them

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::probe::ProbeError;

const HTTPS_PREFIX: &str = "https://";
const DEFAULT_TLS_PORT: u16 = 443;

/// Status of a monitor as reported by UptimeRobot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum MonitorStatus {
    Paused,
    NotCheckedYet,
    Up,
    SeemsDown,
    Down,
    Other(u8),
}

impl From<u8> for MonitorStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => MonitorStatus::Paused,
            1 => MonitorStatus::NotCheckedYet,
            2 => MonitorStatus::Up,
            8 => MonitorStatus::SeemsDown,
            9 => MonitorStatus::Down,
            other => MonitorStatus::Other(other),
        }
    }
}

impl From<MonitorStatus> for u8 {
    fn from(status: MonitorStatus) -> Self {
        match status {
            MonitorStatus::Paused => 0,
            MonitorStatus::NotCheckedYet => 1,
            MonitorStatus::Up => 2,
            MonitorStatus::SeemsDown => 8,
            MonitorStatus::Down => 9,
            MonitorStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Paused => write!(f, "paused"),
            MonitorStatus::NotCheckedYet => write!(f, "not checked yet"),
            MonitorStatus::Up => write!(f, "up"),
            MonitorStatus::SeemsDown => write!(f, "seems down"),
            MonitorStatus::Down => write!(f, "down"),
            MonitorStatus::Other(code) => write!(f, "status {}", code),
        }
    }
}

/// A monitor as returned by `getMonitors`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Monitor {
    pub id: u64,
    #[serde(rename = "friendly_name")]
    pub display_name: String,
    pub url: String,
    pub status: MonitorStatus,
}

impl Monitor {
    pub fn is_https(&self) -> bool {
        self.url.starts_with(HTTPS_PREFIX)
    }

    pub fn is_up(&self) -> bool {
        self.status == MonitorStatus::Up
    }
}

/// Monitors worth a handshake: HTTPS first, then currently up
pub fn select_probe_candidates(monitors: &[Monitor]) -> impl Iterator<Item = &Monitor> {
    monitors
        .iter()
        .filter(|monitor| monitor.is_https())
        .filter(|monitor| monitor.is_up())
}

/// A host:port to open a TLS connection to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
    pub monitor_url: String,
    pub display_name: String,
}

impl ProbeTarget {
    pub fn from_monitor(monitor: &Monitor) -> Result<Self, ProbeError> {
        let invalid = |reason: String| ProbeError::InvalidUrl {
            url: monitor.url.clone(),
            reason,
        };

        let url = Url::parse(&monitor.url).map_err(|e| invalid(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| invalid("no host".to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_TLS_PORT),
            monitor_url: monitor.url.clone(),
            display_name: monitor.display_name.clone(),
        })
    }

    /// Best-effort target for a monitor whose URL could not be parsed
    pub fn unresolved(monitor: &Monitor) -> Self {
        let rest = monitor.url.strip_prefix(HTTPS_PREFIX).unwrap_or(&monitor.url);
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();

        Self {
            host: host.to_string(),
            port: DEFAULT_TLS_PORT,
            monitor_url: monitor.url.clone(),
            display_name: monitor.display_name.clone(),
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
