//! Inbound invocation event, context and the response handed back to the host

use std::collections::BTreeMap;
use std::path::Path;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters `encodeURIComponent` leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// API-gateway style event carrying the UptimeRobot API key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    #[serde(default)]
    pub query_string_parameters: Option<QueryParameters>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameters {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl InvocationEvent {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            query_string_parameters: Some(QueryParameters {
                api_key: Some(api_key.into()),
            }),
        }
    }

    /// The API key, if present and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|q| q.api_key.as_deref())
            .filter(|key| !key.is_empty())
    }
}

/// Load an invocation event from a JSON file
pub fn load_event(path: &Path) -> crate::Result<InvocationEvent> {
    let content = std::fs::read_to_string(path)?;
    let event: InvocationEvent = serde_json::from_str(&content)?;
    Ok(event)
}

/// Where this invocation's logs live
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationContext {
    pub log_group_name: Option<String>,
    pub log_stream_name: Option<String>,
    pub region: String,
}

impl InvocationContext {
    /// CloudWatch console link to this invocation's log stream
    pub fn log_link(&self) -> Option<String> {
        let group = self.log_group_name.as_deref()?;
        let stream = self.log_stream_name.as_deref().unwrap_or_default();

        Some(format!(
            "https://{region}.console.aws.amazon.com/cloudwatch/home?region={region}#logsV2:log-groups/log-group/{group}/log-events/{stream}",
            region = self.region,
            group = utf8_percent_encode(group, URI_COMPONENT),
            stream = utf8_percent_encode(stream, URI_COMPONENT),
        ))
    }
}

/// HTTP-style result returned to the host on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl InvocationResponse {
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body: serde_json::json!({ "status": "OK" }).to_string(),
        }
    }
}
