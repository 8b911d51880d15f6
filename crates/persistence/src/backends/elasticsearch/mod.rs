//! Elasticsearch backend implementation.
//!
//! [`ElasticsearchConnection`] maps entities onto documents of one index:
//! the entity type is the document type and the UID is the document id.
//!
//! # Request flow
//!
//! Reads build a query fragment from a [`Criterion`](crate::types::Criterion),
//! post it to `{type}/_search` or `{type}/_count`, validate the response
//! envelope and extract the hits. Single-document writes go to `{type}/{uid}`,
//! with the UID percent-encoded as a single path segment.
//!
//! Batched writes go through [`flush`](crate::core::Connection::flush):
//!
//! ```text
//! PUT  _settings  {"index": {"refresh_interval": "-1"}}   best effort
//! POST _bulk      one NDJSON payload for the whole transaction
//! PUT  _settings  {"index": {"refresh_interval": "1s"}}   always, best effort
//! ```
//!
//! # Example
//!
//! ```ignore
//! use entity_persistence::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchConnection};
//!
//! let config = ElasticsearchConfig::new("http://localhost:9200/blog");
//! let connection = ElasticsearchConnection::new(config)?;
//! let posts = connection.fetch_by("post", "title", &"prefix:rust".into()).await?;
//! ```

mod bulk;
mod config;
mod connection;
#[cfg(feature = "elasticsearch")]
mod http;
mod response;
pub mod search;
mod transport;


pub use bulk::{BulkPayload, encode_bulk};
pub use config::ElasticsearchConfig;
pub use connection::{ElasticsearchConnection, WriteOutcome};
#[cfg(feature = "elasticsearch")]
pub use http::HttpTransport;
pub use response::{extract_count, extract_documents, validate_response};
pub use transport::{
    EsRequest, EsResponse, EsTransport, HttpMethod, RequestBody, TransportError, document_path,
    encode_segment,
};
