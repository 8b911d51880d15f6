//! Entity Persistence Layer
//!
//! This crate maps in-memory entities onto documents of an Elasticsearch-like
//! search store. It translates simple field criteria into the store's query
//! DSL, runs single-document operations with response validation, and
//! batches entity mutations into one bulk request.
//!
//! # Features
//!
//! - **Criteria**: exact terms, ranges, single-sided bounds, regexp, wildcard
//!   and prefix matches, parsed once from raw values
//! - **Validation**: every response envelope is checked for errors, non-200
//!   statuses and failed shards before it is read
//! - **Transactions**: in-memory or file-spooled batches flushed through
//!   `_bulk` with index refresh suspended for the duration
//! - **Property access**: per-entity registries of readable and writable
//!   fields, with free-form attributes
//!
//! # Backend Features
//!
//! - `elasticsearch` (default) - HTTP transport over the official client
//!
//! # Architecture
//!
//! - [`types`] - Search criteria and document payloads
//! - [`error`] - Error types for all operations
//! - [`property`] - Property accessors and registries
//! - [`core`] - Entity, connection and transaction traits, connection events
//! - [`transactions`] - Transaction implementations
//! - [`backends`] - Store backends
//!
//! # Criteria
//!
//! ```
//! use entity_persistence::backends::elasticsearch::search::build_query;
//! use serde_json::json;
//!
//! let fragment = build_query("age", &json!([18, 30])).unwrap();
//! assert_eq!(
//!     fragment.to_value(),
//!     json!({"range": {"age": {"from": 18, "to": 30}}})
//! );
//!
//! let fragment = build_query("name", &json!("prefix:jo")).unwrap();
//! assert_eq!(fragment.to_value(), json!({"prefix": {"name": "jo"}}));
//! ```
//!
//! # Batched writes
//!
//! ```no_run
//! use entity_persistence::backends::elasticsearch::{ElasticsearchConfig, ElasticsearchConnection};
//! use entity_persistence::core::{Connection, Mutation, Transaction};
//! use entity_persistence::transactions::FileTransaction;
//!
//! # #[cfg(feature = "elasticsearch")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = ElasticsearchConnection::new(ElasticsearchConfig::default())?;
//!
//! let mut tx = FileTransaction::new()?;
//! tx.persist(Mutation::delete("post", "p1"))?;
//! tx.persist(Mutation::delete("post", "p2"))?;
//!
//! connection.flush(&tx).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod property;
pub mod transactions;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use property::{Property, PropertyRegistry};
pub use types::{Criterion, DocumentPayload};

// Re-export core traits
pub use core::{Connection, Entity, EntitySnapshot, EntityState, Mutation, Transaction};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
