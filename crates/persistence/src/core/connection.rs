//! Store connection trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EntityError, StorageResult};
use crate::types::{Criterion, DocumentPayload};

use super::entity::{Entity, EntitySnapshot};
use super::transaction::Transaction;

/// Document operations against a search store.
///
/// Reads fail on any invalid response. Single-document writes report an
/// invalid response, or a missing document on delete, as `Ok(false)` plus a
/// warning event instead.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Returns a short name for the store behind this connection.
    fn backend_name(&self) -> &'static str;

    /// Counts the documents of `entity_type` matching `criterion` on `field`.
    async fn count_by(
        &self,
        entity_type: &str,
        field: &str,
        criterion: &Criterion,
    ) -> StorageResult<u64>;

    /// Fetches the documents of `entity_type` matching `criterion` on `field`.
    async fn fetch_by(
        &self,
        entity_type: &str,
        field: &str,
        criterion: &Criterion,
    ) -> StorageResult<Vec<DocumentPayload>>;

    /// Sends a native search query as-is and extracts the matching documents.
    async fn raw_query(
        &self,
        entity_type: &str,
        query: Value,
    ) -> StorageResult<Vec<DocumentPayload>>;

    /// Creates or replaces a single document.
    ///
    /// Children are routed through their parent, which must already be
    /// persisted; that is checked before anything is sent.
    async fn save(&self, snapshot: &EntitySnapshot) -> StorageResult<bool>;

    /// Deletes a single document.
    async fn delete(&self, entity_type: &str, uid: &str) -> StorageResult<bool>;

    /// Writes every mutation of `transaction` in one bulk request.
    async fn flush(&self, transaction: &dyn Transaction) -> StorageResult<()>;

    /// Snapshots and saves an entity.
    async fn save_entity<E: Entity>(&self, entity: &E) -> StorageResult<bool>
    where
        Self: Sized,
    {
        let snapshot = entity.snapshot()?;
        self.save(&snapshot).await
    }

    /// Deletes the document of an entity.
    async fn delete_entity<E: Entity>(&self, entity: &E) -> StorageResult<bool>
    where
        Self: Sized,
    {
        let uid = entity.uid().ok_or_else(|| EntityError::MissingUid {
            entity_type: E::TYPE.to_string(),
        })?;
        self.delete(E::TYPE, uid).await
    }
}
