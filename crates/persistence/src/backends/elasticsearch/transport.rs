//! Transport seam between the connection and the HTTP client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;

use crate::error::EntityError;

/// Bytes escaped in a single path segment. Matches the set the client's
/// typed `*Parts` builders use, so ids never split or end the path.
const SEGMENT_ENCODED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'%')
    .add(b'/');

/// Percent-encodes `segment` as one URL path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODED).to_string()
}

/// Returns the path of one document: `{entity_type}/{uid}`, each part
/// encoded as its own segment.
///
/// Empty, `.` and `..` UIDs are rejected: URL resolution collapses them even
/// when escaped, so they would address the type or the index instead.
pub fn document_path(entity_type: &str, uid: &str) -> Result<String, EntityError> {
    if matches!(uid, "" | "." | "..") {
        return Err(EntityError::InvalidUid {
            entity_type: entity_type.to_string(),
            uid: uid.to_string(),
        });
    }
    Ok(format!("{}/{}", encode_segment(entity_type), encode_segment(uid)))
}

/// HTTP methods used by the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A JSON document.
    Json(Value),
    /// Newline-delimited JSON, as taken by `_bulk`.
    NdJson(String),
}

/// A request to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EsRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path relative to the store base URL, without a leading slash.
    pub path: String,
    /// Query string parameters, in order.
    pub query: Vec<(String, String)>,
    /// Request payload, if any.
    pub body: Option<RequestBody>,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
}

impl EsRequest {
    /// Creates a request without query parameters or body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Appends a query string parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Sets an NDJSON body.
    pub fn with_ndjson(mut self, body: String) -> Self {
        self.body = Some(RequestBody::NdJson(body));
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the path with its query string, as shown in events and logs.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.path, query.join("&"))
    }
}

/// A decoded response from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EsResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body; [`Value::Null`] when the body was empty.
    pub body: Value,
}

impl EsResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Failures delivering a request or reading its reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The reply body could not be read or decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Sends requests to the store.
///
/// Non-2xx replies are not transport failures: they come back as an
/// [`EsResponse`] and are judged by response validation.
#[async_trait]
pub trait EsTransport: Send + Sync {
    /// Sends `request` and decodes the reply body.
    async fn send(&self, request: EsRequest) -> Result<EsResponse, TransportError>;
}
