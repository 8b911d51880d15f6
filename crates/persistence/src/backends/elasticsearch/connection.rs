//! Elasticsearch connection.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::core::{
    Connection, ConnectionEvent, ConnectionObserver, EntitySnapshot, TracingObserver, Transaction,
};
use crate::error::{BackendError, ResourceError, StorageError, StorageResult};
use crate::types::{Criterion, DocumentPayload};

use super::bulk::encode_bulk;
use super::config::ElasticsearchConfig;
use super::response::{extract_count, extract_documents, validate_response};
use super::search::{build, count_body, search_body};
use super::transport::{
    EsRequest, EsResponse, EsTransport, HttpMethod, document_path, encode_segment,
};

const BACKEND_NAME: &str = "elasticsearch";

/// Result of a single-document write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store accepted the document.
    Written {
        /// UID the document was stored under: the `_id` the store reported,
        /// or the snapshot's own UID when the response carries none.
        uid: Option<String>,
    },
    /// The store rejected the write and a warning event was emitted.
    Rejected,
}

impl WriteOutcome {
    /// Returns true if the store accepted the document.
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }

    /// Returns the UID of the written document, if known.
    pub fn uid(&self) -> Option<&str> {
        match self {
            WriteOutcome::Written { uid } => uid.as_deref(),
            WriteOutcome::Rejected => None,
        }
    }
}

/// A connection to one Elasticsearch index.
///
/// Entity types map to document types under the configured base URL, so a
/// `user` entity with UID `42` lives at `{url}user/42`.
pub struct ElasticsearchConnection {
    transport: Arc<dyn EsTransport>,
    observer: Arc<dyn ConnectionObserver>,
    config: ElasticsearchConfig,
    /// Serializes flushes, which toggle an index-wide setting.
    flush_guard: Mutex<()>,
}

impl Debug for ElasticsearchConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchConnection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchConnection {
    /// Creates a connection over HTTP.
    #[cfg(feature = "elasticsearch")]
    pub fn new(config: ElasticsearchConfig) -> StorageResult<Self> {
        let transport = super::http::HttpTransport::new(&config)?;
        tracing::info!(url = %transport.base_url(), "Elasticsearch connection initialized");
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a connection over an arbitrary transport.
    pub fn with_transport(config: ElasticsearchConfig, transport: Arc<dyn EsTransport>) -> Self {
        Self {
            transport,
            observer: Arc::new(TracingObserver),
            config,
            flush_guard: Mutex::new(()),
        }
    }

    /// Replaces the event observer.
    pub fn with_observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    fn emit(&self, event: ConnectionEvent) {
        self.observer.notify(&event);
    }

    /// Sends a request, reporting it and any transport failure.
    async fn send(&self, request: EsRequest) -> StorageResult<EsResponse> {
        self.emit(ConnectionEvent::request(
            request.method.as_str(),
            request.target(),
        ));

        match self.transport.send(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.emit(ConnectionEvent::error(e.to_string()));
                Err(BackendError::Transport {
                    backend_name: BACKEND_NAME.to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Runs a query against `{entity_type}/{endpoint}` and returns the
    /// validated response.
    ///
    /// `endpoint` is usually `_search` or `_count`.
    pub async fn run_search<B>(
        &self,
        entity_type: &str,
        body: &B,
        endpoint: &str,
    ) -> StorageResult<Value>
    where
        B: Serialize + ?Sized + Sync,
    {
        let body = serde_json::to_value(body).map_err(|e| BackendError::SerializationError {
            message: format!("failed to encode {} query: {}", endpoint, e),
        })?;

        let path = format!("{}/{}", encode_segment(entity_type), endpoint);
        let mut request = EsRequest::new(HttpMethod::Post, path).with_json(body);
        if self.config.pretty {
            request = request.with_query("pretty", "true");
        }

        let response = self.send(request).await?;
        validate_response(&response.body)?;
        Ok(response.body)
    }

    /// Sets the index refresh interval.
    pub async fn set_refresh_interval(&self, interval: &str) -> StorageResult<()> {
        let request = EsRequest::new(HttpMethod::Put, "_settings")
            .with_json(serde_json::json!({ "index": { "refresh_interval": interval } }));
        let response = self.send(request).await?;
        validate_response(&response.body)?;
        Ok(())
    }

    /// Sets the refresh interval, reporting failure instead of returning it.
    async fn toggle_refresh(&self, interval: &str) {
        if let Err(e) = self.set_refresh_interval(interval).await {
            self.emit(ConnectionEvent::warning(format!(
                "failed to set refresh interval to {}: {}",
                interval, e
            )));
        }
    }

    async fn send_bulk(&self, body: String) -> StorageResult<()> {
        let request = EsRequest::new(HttpMethod::Post, "_bulk")
            .with_ndjson(body)
            .with_timeout(self.config.bulk_timeout());

        let response = self.send(request).await?;
        validate_response(&response.body)?;

        if response.body.get("errors").and_then(Value::as_bool) == Some(true) {
            let failed = count_failed_items(&response.body);
            self.emit(ConnectionEvent::warning(format!(
                "bulk request completed with {} failed item(s)",
                failed
            )));
        }

        Ok(())
    }

    /// Writes one document and reports the UID it was stored under.
    ///
    /// Snapshots without a UID are posted to `{type}` and the store assigns
    /// one; it is returned here so the entity can be hydrated with it.
    pub async fn index_document(
        &self,
        snapshot: &EntitySnapshot,
    ) -> StorageResult<WriteOutcome> {
        let parent = snapshot.routing_parent()?;

        let request = match &snapshot.uid {
            Some(uid) => {
                EsRequest::new(HttpMethod::Put, document_path(&snapshot.entity_type, uid)?)
            }
            None => EsRequest::new(HttpMethod::Post, encode_segment(&snapshot.entity_type)),
        };
        let mut request = request.with_json(Value::Object(snapshot.document.clone()));
        if let Some(parent) = parent {
            request = request.with_query("parent", parent);
        }

        let response = self.send(request).await?;
        if let Err(e) = validate_response(&response.body) {
            self.degrade(e.into())?;
            return Ok(WriteOutcome::Rejected);
        }

        let uid = match response.body.get("_id").and_then(Value::as_str) {
            Some(assigned) => {
                if snapshot.uid.is_none() {
                    tracing::debug!(
                        entity_type = %snapshot.entity_type,
                        uid = assigned,
                        "Store assigned document uid"
                    );
                }
                Some(assigned.to_string())
            }
            None => snapshot.uid.clone(),
        };
        Ok(WriteOutcome::Written { uid })
    }

    fn degrade(&self, err: StorageError) -> StorageResult<bool> {
        if err.is_recoverable_write_failure() {
            self.emit(ConnectionEvent::warning(err.to_string()));
            Ok(false)
        } else {
            Err(err)
        }
    }
}

fn count_failed_items(response: &Value) -> usize {
    response
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter(|item| item.values().any(|result| result.get("error").is_some()))
                .count()
        })
        .unwrap_or(0)
}

#[async_trait]
impl Connection for ElasticsearchConnection {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn count_by(
        &self,
        entity_type: &str,
        field: &str,
        criterion: &Criterion,
    ) -> StorageResult<u64> {
        let fragment = build(field, criterion);
        let response = self
            .run_search(entity_type, &count_body(&fragment), "_count")
            .await?;
        extract_count(&response)
    }

    async fn fetch_by(
        &self,
        entity_type: &str,
        field: &str,
        criterion: &Criterion,
    ) -> StorageResult<Vec<DocumentPayload>> {
        let fragment = build(field, criterion);
        let response = self
            .run_search(entity_type, &search_body(&fragment), "_search")
            .await?;
        extract_documents(&response)
    }

    async fn raw_query(
        &self,
        entity_type: &str,
        query: Value,
    ) -> StorageResult<Vec<DocumentPayload>> {
        let response = self.run_search(entity_type, &query, "_search").await?;
        extract_documents(&response)
    }

    async fn save(&self, snapshot: &EntitySnapshot) -> StorageResult<bool> {
        Ok(self.index_document(snapshot).await?.is_written())
    }

    async fn delete(&self, entity_type: &str, uid: &str) -> StorageResult<bool> {
        let request = EsRequest::new(HttpMethod::Delete, document_path(entity_type, uid)?);
        let response = self.send(request).await?;
        if let Err(e) = validate_response(&response.body) {
            return self.degrade(e.into());
        }

        let found = response
            .body
            .get("found")
            .and_then(Value::as_bool)
            .or_else(|| {
                response
                    .body
                    .get("result")
                    .and_then(Value::as_str)
                    .map(|result| result == "deleted")
            })
            .unwrap_or(false);

        if found {
            Ok(true)
        } else {
            self.degrade(
                ResourceError::NotFound {
                    entity_type: entity_type.to_string(),
                    uid: uid.to_string(),
                }
                .into(),
            )
        }
    }

    async fn flush(&self, transaction: &dyn Transaction) -> StorageResult<()> {
        if transaction.is_empty() {
            tracing::debug!("Skipping flush of empty transaction");
            return Ok(());
        }

        let _guard = self.flush_guard.lock().await;
        let payload = encode_bulk(transaction)?;
        tracing::debug!(actions = payload.actions, "Flushing transaction");

        self.toggle_refresh(&self.config.disabled_refresh_interval)
            .await;
        let result = self.send_bulk(payload.body).await;
        self.toggle_refresh(&self.config.refresh_interval).await;

        result
    }
}
