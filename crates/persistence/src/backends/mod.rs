//! Store backend implementations.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Elasticsearch | `elasticsearch` (default) | Document store reached over HTTP |
//!
//! The Elasticsearch module itself is always compiled; the feature only
//! gates the HTTP transport, so the connection can run over any
//! [`EsTransport`](elasticsearch::EsTransport).
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "elasticsearch")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use entity_persistence::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchConnection};
//! use entity_persistence::core::Connection;
//! use entity_persistence::types::Criterion;
//!
//! let connection = ElasticsearchConnection::new(ElasticsearchConfig::from_env())?;
//! let adults = connection.count_by("user", "age", &Criterion::from("gte:18")).await?;
//! # Ok(())
//! # }
//! ```

pub mod elasticsearch;
