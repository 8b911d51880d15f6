//! Transaction traits for batched writes.
//!
//! A transaction is an ordered, append-only list of [`Mutation`]s. It never
//! talks to the store itself: a connection consumes it in one pass when it
//! is flushed, encoding every mutation into a single bulk request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EntityError, StorageResult, TransactionResult};

use super::entity::{Entity, EntitySnapshot};

/// Bulk action a mutation is encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkAction {
    /// Create a document (new entity).
    Index,
    /// Rewrite a document (already persisted entity).
    Update,
    /// Remove a document.
    Delete,
}

impl BulkAction {
    /// Returns the action name used in bulk payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkAction::Index => "index",
            BulkAction::Update => "update",
            BulkAction::Delete => "delete",
        }
    }

    /// Returns true if the action line is followed by a document line.
    pub fn has_body(&self) -> bool {
        !matches!(self, BulkAction::Delete)
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending entity mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mutation {
    /// Create or replace the entity's document.
    Upsert(EntitySnapshot),
    /// Remove a document.
    Delete {
        /// Store type tag.
        entity_type: String,
        /// Document UID.
        uid: String,
        /// Parent UID for routed documents.
        #[serde(default)]
        parent_uid: Option<String>,
    },
}

impl Mutation {
    /// Creates a delete mutation.
    pub fn delete(entity_type: impl Into<String>, uid: impl Into<String>) -> Self {
        Mutation::Delete {
            entity_type: entity_type.into(),
            uid: uid.into(),
            parent_uid: None,
        }
    }

    /// Creates a delete mutation for a routed child document.
    pub fn delete_child(
        entity_type: impl Into<String>,
        uid: impl Into<String>,
        parent_uid: impl Into<String>,
    ) -> Self {
        Mutation::Delete {
            entity_type: entity_type.into(),
            uid: uid.into(),
            parent_uid: Some(parent_uid.into()),
        }
    }

    /// Converts a snapshot into the mutation its state calls for.
    ///
    /// Deleted entities become [`Mutation::Delete`] and must carry a UID;
    /// everything else is an upsert.
    pub fn from_snapshot(snapshot: EntitySnapshot) -> Result<Self, EntityError> {
        if !snapshot.is_deleted() {
            return Ok(Mutation::Upsert(snapshot));
        }

        let parent_uid = snapshot.bulk_parent()?.map(str::to_string);
        match snapshot.uid {
            Some(uid) => Ok(Mutation::Delete {
                entity_type: snapshot.entity_type,
                uid,
                parent_uid,
            }),
            None => Err(EntityError::MissingUid {
                entity_type: snapshot.entity_type,
            }),
        }
    }

    /// Returns the bulk action, classified from the state captured when the
    /// mutation was created.
    pub fn action(&self) -> BulkAction {
        match self {
            Mutation::Upsert(snapshot) if snapshot.is_deleted() => BulkAction::Delete,
            Mutation::Upsert(snapshot) if snapshot.is_persisted() => BulkAction::Update,
            Mutation::Upsert(_) => BulkAction::Index,
            Mutation::Delete { .. } => BulkAction::Delete,
        }
    }

    /// Returns the store type tag.
    pub fn entity_type(&self) -> &str {
        match self {
            Mutation::Upsert(snapshot) => &snapshot.entity_type,
            Mutation::Delete { entity_type, .. } => entity_type,
        }
    }

    /// Returns the document UID, if known.
    pub fn uid(&self) -> Option<&str> {
        match self {
            Mutation::Upsert(snapshot) => snapshot.uid.as_deref(),
            Mutation::Delete { uid, .. } => Some(uid),
        }
    }
}

/// Iterator over the mutations of a transaction, in append order.
pub type MutationIter<'a> = Box<dyn Iterator<Item = TransactionResult<Mutation>> + Send + 'a>;

/// An ordered batch of pending mutations.
///
/// Implementations must preserve append order and must not be modified
/// while a flush iterates over them; flushing borrows the transaction
/// immutably for that reason.
pub trait Transaction: Send + Sync {
    /// Appends a mutation.
    fn persist(&mut self, mutation: Mutation) -> TransactionResult<()>;

    /// Returns the number of mutations.
    fn len(&self) -> usize;

    /// Returns true if no mutation has been appended.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the mutations in append order.
    fn iter(&self) -> TransactionResult<MutationIter<'_>>;
}

/// Entity-level helpers for any [`Transaction`].
pub trait TransactionExt: Transaction {
    /// Snapshots an entity and appends the mutation its state calls for.
    fn persist_entity<E: Entity>(&mut self, entity: &E) -> StorageResult<()> {
        let mutation = Mutation::from_snapshot(entity.snapshot()?)?;
        self.persist(mutation)?;
        Ok(())
    }
}

impl<T: Transaction + ?Sized> TransactionExt for T {}
