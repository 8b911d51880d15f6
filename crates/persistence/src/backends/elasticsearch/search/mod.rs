//! Elasticsearch search query translation.
//!
//! Translates field criteria into Elasticsearch Query DSL.

pub mod query_builder;

pub use query_builder::{QueryFragment, build, build_query, count_body, search_body};
