//! HTTP client abstraction for testability
//!
//! Every outbound API call goes through [`HttpClient`]. The production
//! implementation buffers the whole body, decodes JSON bodies when the
//! response says so, and turns statuses outside 200..=399 into errors that
//! still carry the buffered response.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};

use crate::config::Verbosity;
use crate::SslCheckError;

/// HTTP method used by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent verbatim
    Text(String),
    /// Sent as `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Serialized to compact JSON, sent as `application/json`
    Json(serde_json::Value),
}

/// An outbound HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<RequestBody>,
    /// Header overrides, applied after the defaults derived from the body
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    pub fn form(mut self, params: &[(&str, &str)]) -> Self {
        self.body = Some(RequestBody::Form(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Buffered response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    /// Parse `raw` as JSON when the content type is JSON, keep it as text otherwise
    pub fn decode(content_type: Option<&str>, raw: String) -> crate::Result<Self> {
        match content_type {
            Some(ct) if is_json_content_type(ct) => {
                Ok(ResponseBody::Json(serde_json::from_str(&raw)?))
            }
            _ => Ok(ResponseBody::Text(raw)),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            ResponseBody::Json(_) => None,
        }
    }

    fn len(&self) -> usize {
        match self {
            ResponseBody::Text(text) => text.len(),
            ResponseBody::Json(value) => value.to_string().len(),
        }
    }
}

/// `application/json`, optionally followed by parameters
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type == "application/json" || content_type.starts_with("application/json;")
}

/// HTTP response from a request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    /// Header names are lower case
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..=399).contains(&self.status)
    }
}

/// Resolve 2xx and 3xx responses, fail everything else with the response attached
pub fn classify(response: HttpResponse) -> crate::Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(SslCheckError::HttpStatus {
            response: Box::new(response),
        })
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a request and buffer the full response
    async fn request(&self, request: HttpRequest) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    verbosity: Verbosity,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration, verbosity: Verbosity) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SslCheckError::Http(format!("Building HTTP client: {}", e)))?;

        Ok(Self { client, verbosity })
    }

    fn build(&self, request: &HttpRequest) -> crate::Result<reqwest::Request> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());

        builder = match &request.body {
            Some(RequestBody::Json(value)) => {
                let payload = serde_json::to_string(value)?;
                builder
                    .header(CONTENT_TYPE, "application/json")
                    .header(CONTENT_LENGTH, payload.len())
                    .body(payload)
            }
            Some(RequestBody::Form(params)) => builder.form(params),
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            None => builder,
        };

        let mut built = builder.build().map_err(|e| {
            SslCheckError::Http(format!("{} {} failed: {}", request.method, request.url, e))
        })?;

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SslCheckError::Http(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SslCheckError::Http(format!("Invalid header value: {}", e)))?;
            built.headers_mut().insert(name, value);
        }

        Ok(built)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(&self, request: HttpRequest) -> crate::Result<HttpResponse> {
        let built = self.build(&request)?;

        match built.body().and_then(|b| b.as_bytes()) {
            Some(payload) => tracing::info!(
                "HTTP {} {} payload {} bytes",
                request.method,
                request.url,
                payload.len()
            ),
            None => tracing::info!("HTTP {} {}", request.method, request.url),
        }

        let response = self.client.execute(built).await.map_err(|e| {
            let kind = if e.is_timeout() { "timed out" } else { "failed" };
            SslCheckError::Http(format!("{} {} {}: {}", request.method, request.url, kind, e))
        })?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let raw = response
            .text()
            .await
            .map_err(|e| SslCheckError::Http(format!("Reading response body: {}", e)))?;

        let content_type = headers
            .iter()
            .find(|(k, _)| k == "content-type")
            .map(|(_, v)| v.as_str());
        let body = ResponseBody::decode(content_type, raw)?;

        let response = HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        };

        if self.verbosity.is_verbose() {
            tracing::info!(
                "Got response {} {} headers={:?} body={:?}",
                response.status,
                response.reason,
                response.headers,
                response.body
            );
        } else {
            tracing::debug!(
                "{} {} -> {} ({} bytes)",
                request.method,
                request.url,
                response.status,
                response.body.len()
            );
        }

        classify(response)
    }
}
