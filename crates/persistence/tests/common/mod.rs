//! Test infrastructure for the persistence layer.
//!
//! Sample entities and a scripted in-memory transport shared by the
//! integration tests.

#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod transport;

pub use fixtures::*;
pub use transport::*;
