//! Slack incoming-webhook sender

use std::sync::Arc;

use crate::io::{HttpClient, HttpRequest};
use crate::notification::NotificationMessage;
use crate::SslCheckError;

/// Posts notification messages to a Slack incoming webhook
pub struct SlackWebhook {
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for SlackWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebhook").finish()
    }
}

impl SlackWebhook {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub async fn send(
        &self,
        webhook_url: &str,
        message: &NotificationMessage,
    ) -> crate::Result<()> {
        tracing::info!("Sending {} blocks to Slack webhook", message.blocks.len());

        let body = serde_json::to_value(message)?;
        let response = self
            .http
            .request(HttpRequest::post(webhook_url).json(body))
            .await
            .map_err(|e| {
                let detail = match e.response() {
                    Some(response) => format!(
                        "{} {} {:?}",
                        response.status, response.reason, response.body
                    ),
                    None => e.to_string(),
                };
                tracing::warn!("Request failed {}", detail);
                SslCheckError::WebhookSend(detail)
            })?;

        tracing::info!(
            "Got response {} body {:?} {:?}",
            response.status,
            response.header("content-type"),
            response.body
        );
        Ok(())
    }
}
