//! Core persistence traits and abstractions.
//!
//! - [`Entity`] - What the layer needs to know about a stored entity
//! - [`Connection`] - Document operations against a search store
//! - [`Transaction`] - An ordered batch of [`Mutation`]s written in one request
//! - [`ConnectionObserver`] - Receives request, error and warning events
//!
//! # Batched writes
//!
//! ```
//! use entity_persistence::core::{Mutation, Transaction};
//! use entity_persistence::transactions::MemoryTransaction;
//!
//! let mut tx = MemoryTransaction::new();
//! tx.persist(Mutation::delete("post", "p1")).unwrap();
//! tx.persist(Mutation::delete("post", "p2")).unwrap();
//! assert_eq!(tx.len(), 2);
//! ```

mod connection;
mod entity;
mod events;
mod transaction;

pub use connection::Connection;
pub use entity::{Entity, EntitySnapshot, EntityState, ParentRef};
pub use events::{
    BroadcastObserver, CallbackObserver, ConnectionEvent, ConnectionObserver, TracingObserver,
};
pub use transaction::{BulkAction, Mutation, MutationIter, Transaction, TransactionExt};
