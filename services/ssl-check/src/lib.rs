//! ssl-check - TLS handshake check for UptimeRobot HTTPS monitors
//!
//! Fetches the monitors of an UptimeRobot account, opens a TLS connection to
//! every HTTPS monitor that is currently up, and reports failed handshakes to
//! the Slack webhook registered as an alert contact.

pub mod config;
pub mod error;
pub mod invocation;
pub mod io;
pub mod monitor;
pub mod notification;
pub mod probe;
pub mod slack;
pub mod uptime_robot;

pub use config::{load_config, Config};
pub use error::{Result, SslCheckError};
pub use invocation::{InvocationContext, InvocationEvent, InvocationResponse};

use std::sync::Arc;

use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notification::format_failures;
use crate::probe::{probe_all, Prober, TlsProber};
use crate::slack::SlackWebhook;
use crate::uptime_robot::UptimeRobotClient;

/// Builder for [`SslCheck`], allowing the HTTP client and prober to be injected
pub struct SslCheckBuilder {
    config: Config,
    http: Option<Arc<dyn HttpClient>>,
    prober: Option<Arc<dyn Prober>>,
}

impl SslCheckBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: None,
            prober: None,
        }
    }

    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn build(self) -> Result<SslCheck> {
        self.config.validate()?;

        let http = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestHttpClient::new(
                self.config.timeout(),
                self.config.verbosity(),
            )?),
        };
        let prober = match self.prober {
            Some(prober) => prober,
            None => Arc::new(TlsProber::new(self.config.timeout())?),
        };

        Ok(SslCheck {
            uptime_robot: UptimeRobotClient::new(&self.config.uptime_robot, Arc::clone(&http)),
            webhook: SlackWebhook::new(http),
            prober,
            config: self.config,
        })
    }
}

/// One configured check, runnable once per invocation
pub struct SslCheck {
    config: Config,
    uptime_robot: UptimeRobotClient,
    prober: Arc<dyn Prober>,
    webhook: SlackWebhook,
}

impl SslCheck {
    /// Context for this process, with the configured region
    pub fn context(
        &self,
        log_group_name: Option<String>,
        log_stream_name: Option<String>,
    ) -> InvocationContext {
        InvocationContext {
            log_group_name,
            log_stream_name,
            region: self.config.region().to_string(),
        }
    }

    /// Run the whole check for one invocation
    pub async fn handle(
        &self,
        event: &InvocationEvent,
        context: &InvocationContext,
    ) -> Result<InvocationResponse> {
        tracing::info!(
            "Got event, api key present: {}, log group: {:?}",
            event.api_key().is_some(),
            context.log_group_name
        );

        let Some(api_key) = event.api_key() else {
            tracing::warn!("No uptime robot API key");
            return Err(SslCheckError::MissingApiKey);
        };

        let monitors = self.uptime_robot.list_monitors(api_key).await?;
        let results = probe_all(Arc::clone(&self.prober), &monitors, self.config.verbosity()).await;
        tracing::info!(
            "Probed {} of {} monitors, {} failed",
            results.len(),
            monitors.len(),
            results.iter().filter(|r| r.is_failure()).count()
        );

        let message = format_failures(
            &results,
            chrono::Utc::now(),
            context.log_link().as_deref(),
        );

        let Some(webhook_url) = self.uptime_robot.find_webhook_url(api_key).await? else {
            tracing::warn!(
                "No Slack webhook contact in uptime robot, payload {}",
                serde_json::to_string_pretty(&message).unwrap_or_default()
            );
            return Err(SslCheckError::NoWebhookContact);
        };

        match &message {
            Some(message) => self.webhook.send(&webhook_url, message).await?,
            None => tracing::info!("No handshake failures, nothing to send"),
        }

        Ok(InvocationResponse::ok())
    }
}
