//! HTTP transport over the official Elasticsearch client.

use async_trait::async_trait;
use elasticsearch::Elasticsearch;
use elasticsearch::http::headers::{CONTENT_TYPE, HeaderMap, HeaderValue};
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::http::{Method, Url};
use serde_json::Value;

use crate::error::{BackendError, StorageResult};

use super::config::ElasticsearchConfig;
use super::transport::{EsRequest, EsResponse, EsTransport, HttpMethod, RequestBody, TransportError};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Sends requests with the `elasticsearch` crate's raw request API.
pub struct HttpTransport {
    client: Elasticsearch,
    base_url: String,
}

impl HttpTransport {
    /// Builds a transport for the store configured in `config`.
    pub fn new(config: &ElasticsearchConfig) -> StorageResult<Self> {
        let base_url = config.base_url();

        let parsed_url: Url = base_url.parse().map_err(|e| BackendError::ConnectionFailed {
            backend_name: "elasticsearch".to_string(),
            message: format!("Invalid URL: {}", e),
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Failed to build transport: {}", e),
            })?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            base_url,
        })
    }

    /// Returns the normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::Get,
        HttpMethod::Post => Method::Post,
        HttpMethod::Put => Method::Put,
        HttpMethod::Delete => Method::Delete,
    }
}

#[async_trait]
impl EsTransport for HttpTransport {
    async fn send(&self, request: EsRequest) -> Result<EsResponse, TransportError> {
        let mut headers = HeaderMap::new();
        let body = match request.body {
            Some(RequestBody::Json(value)) => Some(value.to_string()),
            Some(RequestBody::NdJson(payload)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(NDJSON_CONTENT_TYPE));
                Some(payload)
            }
            None => None,
        };
        let query = (!request.query.is_empty()).then_some(&request.query);

        let response = self
            .client
            .send(
                method(request.method),
                &request.path,
                headers,
                query,
                body,
                request.timeout,
            )
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(e.to_string())
                } else {
                    TransportError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status_code().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                TransportError::InvalidResponse(format!("status {}: {}", status, e))
            })?
        };

        Ok(EsResponse { status, body })
    }
}
