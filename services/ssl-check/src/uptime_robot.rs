//! UptimeRobot API client
//!
//! Both endpoints are form-encoded POSTs authenticated by the account API key.
//! Every response is wrapped in an envelope whose `stat` field must be `"ok"`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::UptimeRobotConfig;
use crate::io::{HttpClient, HttpRequest, HttpResponse};
use crate::monitor::Monitor;
use crate::SslCheckError;

/// Decoded result of one monitoring API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    Ok(T),
    /// The server answered outside 200..=399
    Rejected(Box<HttpResponse>),
    /// The envelope said `stat != "ok"`; carries the API's message
    ApplicationError(String),
    /// The call never produced a usable envelope
    TransportError(String),
}

impl<T> ApiOutcome<T> {
    pub fn into_result(self) -> crate::Result<T> {
        match self {
            ApiOutcome::Ok(payload) => Ok(payload),
            ApiOutcome::Rejected(response) => Err(SslCheckError::HttpStatus { response }),
            ApiOutcome::ApplicationError(message) => Err(SslCheckError::UpstreamApi(message)),
            ApiOutcome::TransportError(detail) => Err(SslCheckError::Http(detail)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    stat: String,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MonitorsPayload {
    monitors: Vec<Monitor>,
}

/// An alert contact as returned by `getAlertContacts`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlertContact {
    #[serde(rename = "type", default)]
    pub contact_type: u8,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct AlertContactsPayload {
    alert_contacts: Vec<AlertContact>,
}

/// Decode a JSON envelope into the declared payload
pub fn decode_envelope<T: DeserializeOwned>(response: &HttpResponse) -> ApiOutcome<T> {
    let Some(value) = response.body.as_json() else {
        return ApiOutcome::TransportError(format!(
            "Expected a JSON response, got {}",
            response.header("content-type").unwrap_or("no content type")
        ));
    };

    let envelope: Envelope = match serde_json::from_value(value.clone()) {
        Ok(envelope) => envelope,
        Err(e) => return ApiOutcome::TransportError(format!("Malformed envelope: {}", e)),
    };

    if envelope.stat != "ok" {
        let message = envelope
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("UptimeRobot returned stat={}", envelope.stat));
        return ApiOutcome::ApplicationError(message);
    }

    match serde_json::from_value(value.clone()) {
        Ok(payload) => ApiOutcome::Ok(payload),
        Err(e) => ApiOutcome::TransportError(format!("Malformed payload: {}", e)),
    }
}

/// First contact whose value mentions the webhook host marker
pub fn find_webhook_contact<'a>(contacts: &'a [AlertContact], marker: &str) -> Option<&'a str> {
    contacts
        .iter()
        .find(|contact| contact.value.contains(marker))
        .map(|contact| contact.value.as_str())
}

/// Client for the monitor and alert-contact endpoints
pub struct UptimeRobotClient {
    base_url: String,
    webhook_host_marker: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for UptimeRobotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UptimeRobotClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl UptimeRobotClient {
    pub fn new(config: &UptimeRobotConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            webhook_host_marker: config.webhook_host_marker.clone(),
            http,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, api_key: &str) -> ApiOutcome<T> {
        let url = format!("{}/{}", self.base_url, method);
        let request = HttpRequest::post(url).form(&[("api_key", api_key)]);

        match self.http.request(request).await {
            Ok(response) => decode_envelope(&response),
            Err(SslCheckError::HttpStatus { response }) => ApiOutcome::Rejected(response),
            Err(SslCheckError::Http(detail)) => ApiOutcome::TransportError(detail),
            Err(e) => ApiOutcome::TransportError(e.to_string()),
        }
    }

    /// All monitors of the account, unfiltered
    pub async fn list_monitors(&self, api_key: &str) -> crate::Result<Vec<Monitor>> {
        let payload: MonitorsPayload = self.call("getMonitors", api_key).await.into_result()?;
        tracing::debug!("Fetched {} monitors", payload.monitors.len());
        Ok(payload.monitors)
    }

    /// Slack webhook URL registered as an alert contact, if any
    pub async fn find_webhook_url(&self, api_key: &str) -> crate::Result<Option<String>> {
        let payload: AlertContactsPayload = self
            .call("getAlertContacts", api_key)
            .await
            .into_result()?;

        Ok(find_webhook_contact(&payload.alert_contacts, &self.webhook_host_marker)
            .map(str::to_string))
    }
}
