//! Scripted in-memory transport.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use entity_persistence::backends::elasticsearch::{
    ElasticsearchConfig, ElasticsearchConnection, EsRequest, EsResponse, EsTransport, HttpMethod,
    RequestBody, TransportError,
};
use entity_persistence::core::BroadcastObserver;
use parking_lot::Mutex;
use serde_json::{Value, json};

/// A transport that records requests and answers from a script.
///
/// Unscripted requests are acknowledged with `{"acknowledged": true}`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    requests: Arc<Mutex<Vec<EsRequest>>>,
    replies: Arc<Mutex<HashMap<(HttpMethod, String), Result<EsResponse, TransportError>>>>,
}

impl ScriptedTransport {
    /// Scripts a JSON reply for `method path`.
    pub fn reply(&self, method: HttpMethod, path: &str, body: Value) {
        self.replies
            .lock()
            .insert((method, path.to_string()), Ok(EsResponse::new(200, body)));
    }

    /// Scripts a transport failure for `method path`.
    pub fn fail(&self, method: HttpMethod, path: &str) {
        self.replies.lock().insert(
            (method, path.to_string()),
            Err(TransportError::Timeout("no reply within 30s".to_string())),
        );
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<EsRequest> {
        self.requests.lock().clone()
    }

    /// Returns `METHOD target` for every request sent so far.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| format!("{} {}", r.method, r.target()))
            .collect()
    }
}

#[async_trait]
impl EsTransport for ScriptedTransport {
    async fn send(&self, request: EsRequest) -> Result<EsResponse, TransportError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().push(request);
        self.replies
            .lock()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(EsResponse::new(200, json!({"acknowledged": true}))))
    }
}

/// Creates a connection over a scripted transport, with a broadcast observer.
pub fn scripted_connection() -> (
    ElasticsearchConnection,
    ScriptedTransport,
    Arc<BroadcastObserver>,
) {
    let transport = ScriptedTransport::default();
    let observer = Arc::new(BroadcastObserver::new(256));
    let connection = ElasticsearchConnection::with_transport(
        ElasticsearchConfig::default(),
        Arc::new(transport.clone()),
    )
    .with_observer(observer.clone());
    (connection, transport, observer)
}

/// Returns the JSON body of a request.
pub fn json_body(request: &EsRequest) -> Value {
    match &request.body {
        Some(RequestBody::Json(value)) => value.clone(),
        other => panic!("expected JSON body, got {:?}", other),
    }
}

/// Returns the decoded lines of an NDJSON request body.
pub fn ndjson_lines(request: &EsRequest) -> Vec<Value> {
    match &request.body {
        Some(RequestBody::NdJson(body)) => body
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid NDJSON line"))
            .collect(),
        other => panic!("expected NDJSON body, got {:?}", other),
    }
}
