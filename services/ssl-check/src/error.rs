//! Error types for the ssl-check service

use crate::io::HttpResponse;

/// Errors that can end an ssl-check invocation
#[derive(Debug, thiserror::Error)]
pub enum SslCheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level failure: DNS, connection refused, timeout, body read
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered, but outside the 200..=399 range
    #[error("{} {}", .response.status, .response.reason)]
    HttpStatus { response: Box<HttpResponse> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The monitoring API returned an envelope whose `stat` was not "ok"
    #[error("{0}")]
    UpstreamApi(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("No uptime robot API key")]
    MissingApiKey,

    #[error("No Slack webhook contact")]
    NoWebhookContact,

    #[error("Slack send failed! {0}")]
    WebhookSend(String),
}

impl SslCheckError {
    /// The buffered response, when the failure came from a non-success status
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            SslCheckError::HttpStatus { response } => Some(response),
            _ => None,
        }
    }
}

/// Result type alias for ssl-check operations
pub type Result<T> = std::result::Result<T, SslCheckError>;
