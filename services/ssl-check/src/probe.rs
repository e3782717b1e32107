//! TLS handshake probes and their concurrent fan-out

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tokio_rustls::TlsConnector;

use crate::config::Verbosity;
use crate::monitor::{select_probe_candidates, Monitor, ProbeTarget};
use crate::SslCheckError;

/// Why a single probe failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid monitor URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid TLS server name {host}: {reason}")]
    InvalidServerName { host: String, reason: String },

    #[error("connect {target} failed: {reason}")]
    Connect { target: String, reason: String },

    #[error("TLS handshake with {target} failed: {reason}")]
    Handshake { target: String, reason: String },

    #[error("TLS handshake with {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("probe task for {target} failed: {reason}")]
    Task { target: String, reason: String },
}

/// What a probe observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure(ProbeError),
}

/// One probe target with its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: ProbeTarget,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn error(&self) -> Option<&ProbeError> {
        match &self.outcome {
            ProbeOutcome::Success => None,
            ProbeOutcome::Failure(e) => Some(e),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error().is_some()
    }
}

/// A single handshake attempt against a target
///
/// Implementations must never panic or error past this boundary: every
/// problem is reported as [`ProbeOutcome::Failure`].
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome;
}

/// Opens a bare TLS connection and reports whether the handshake completed
pub struct TlsProber {
    connector: TlsConnector,
    timeout: Duration,
}

impl TlsProber {
    /// Prober trusting the Mozilla root set
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(roots, timeout)
    }

    pub fn with_roots(roots: RootCertStore, timeout: Duration) -> crate::Result<Self> {
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| SslCheckError::Tls(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
        })
    }

    async fn handshake(&self, target: &ProbeTarget) -> Result<(), ProbeError> {
        let server_name = ServerName::try_from(target.host.clone()).map_err(|e| {
            ProbeError::InvalidServerName {
                host: target.host.clone(),
                reason: e.to_string(),
            }
        })?;

        let stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| ProbeError::Connect {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        let tls = self
            .connector
            .connect(server_name, stream)
            .await
            .map_err(|e| ProbeError::Handshake {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        let (_, session) = tls.get_ref();
        tracing::info!(
            "Connected to {} protocol={:?} cipher={:?} peer_certificates={}",
            target,
            session.protocol_version(),
            session.negotiated_cipher_suite().map(|s| s.suite()),
            session.peer_certificates().map_or(0, |certs| certs.len())
        );

        Ok(())
    }
}

#[async_trait]
impl Prober for TlsProber {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
        tracing::info!("Checking {} {}", target.display_name, target.monitor_url);

        match tokio::time::timeout(self.timeout, self.handshake(target)).await {
            Ok(Ok(())) => ProbeOutcome::Success,
            Ok(Err(e)) => ProbeOutcome::Failure(e),
            Err(_) => ProbeOutcome::Failure(ProbeError::Timeout {
                target: target.to_string(),
                timeout: self.timeout,
            }),
        }
    }
}

/// Probe every HTTPS monitor that is currently up
///
/// All probes run concurrently and this returns once every one of them has
/// settled. Results come back in completion order, one per selected monitor.
pub async fn probe_all(
    prober: Arc<dyn Prober>,
    monitors: &[Monitor],
    verbosity: Verbosity,
) -> Vec<ProbeResult> {
    let mut results = Vec::new();
    let mut join_set = JoinSet::new();
    let mut pending = HashMap::new();

    for monitor in select_probe_candidates(monitors) {
        let target = match ProbeTarget::from_monitor(monitor) {
            Ok(target) => target,
            Err(e) => {
                let result = ProbeResult {
                    target: ProbeTarget::unresolved(monitor),
                    outcome: ProbeOutcome::Failure(e),
                };
                log_result(&result, verbosity);
                results.push(result);
                continue;
            }
        };

        let prober = Arc::clone(&prober);
        let task_target = target.clone();
        let handle = join_set.spawn(async move {
            let outcome = prober.probe(&task_target).await;
            ProbeResult {
                target: task_target,
                outcome,
            }
        });
        pending.insert(handle.id(), target);
    }

    tracing::debug!("Waiting for {} probes", pending.len());

    while let Some(joined) = join_set.join_next_with_id().await {
        let result = match joined {
            Ok((id, result)) => {
                pending.remove(&id);
                result
            }
            Err(e) => {
                let Some(target) = pending.remove(&e.id()) else {
                    tracing::error!("Probe task failed for unknown target: {}", e);
                    continue;
                };
                tracing::error!("Probe task for {} failed: {}", target, e);
                ProbeResult {
                    outcome: ProbeOutcome::Failure(ProbeError::Task {
                        target: target.to_string(),
                        reason: e.to_string(),
                    }),
                    target,
                }
            }
        };
        log_result(&result, verbosity);
        results.push(result);
    }

    results
}

fn log_result(result: &ProbeResult, verbosity: Verbosity) {
    let Some(error) = result.error() else {
        return;
    };
    if verbosity.is_verbose() {
        tracing::warn!(
            "Failed {} {} {:?}",
            result.target.host,
            result.target.port,
            error
        );
    } else {
        tracing::warn!("Failed {} {} {}", result.target.host, result.target.port, error);
    }
}
