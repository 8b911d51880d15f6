//! Core types for the persistence layer.
//!
//! - [`Criterion`] - A parsed search criterion for one field
//! - [`DocumentPayload`] - A document body as returned by searches
//!
//! # Examples
//!
//! ```
//! use entity_persistence::types::Criterion;
//! use serde_json::json;
//!
//! let range = Criterion::parse(&json!([1, 5])).unwrap();
//! assert_eq!(range, Criterion::range(1, 5));
//!
//! let exact = Criterion::from("john");
//! assert_eq!(exact, Criterion::term("john"));
//! ```

mod criterion;

pub use criterion::{BoundOp, Criterion, PatternKind};

/// A document body keyed by field name.
///
/// Documents returned from searches carry the store identifier in their
/// `uid` field.
pub type DocumentPayload = serde_json::Map<String, serde_json::Value>;

/// Field name that carries the store identifier in extracted documents.
pub const UID_FIELD: &str = "uid";
