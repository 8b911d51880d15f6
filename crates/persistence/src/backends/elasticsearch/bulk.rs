//! Bulk payload encoding.
//!
//! Each mutation becomes one action line, followed by one document line
//! unless the action is a delete. Every line ends with `\n`, as `_bulk`
//! requires.

use serde_json::{Map, Value};

use crate::core::{BulkAction, Mutation, Transaction};
use crate::error::{EntityError, StorageResult};

/// An encoded `_bulk` payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkPayload {
    /// NDJSON body.
    pub body: String,
    /// Number of encoded mutations.
    pub actions: usize,
}

/// Encodes every mutation of `transaction`, in order.
pub fn encode_bulk(transaction: &dyn Transaction) -> StorageResult<BulkPayload> {
    let mut payload = BulkPayload::default();
    for mutation in transaction.iter()? {
        encode_mutation(&mut payload.body, &mutation?)?;
        payload.actions += 1;
    }
    Ok(payload)
}

fn encode_mutation(out: &mut String, mutation: &Mutation) -> StorageResult<()> {
    let action = mutation.action();

    let mut meta = Map::new();
    meta.insert(
        "_type".to_string(),
        Value::String(mutation.entity_type().to_string()),
    );

    match mutation.uid() {
        Some(uid) => {
            meta.insert("_id".to_string(), Value::String(uid.to_string()));
        }
        // Only new documents may let the store number them
        None if action != BulkAction::Index => {
            return Err(EntityError::MissingUid {
                entity_type: mutation.entity_type().to_string(),
            }
            .into());
        }
        None => {}
    }

    let parent = match mutation {
        Mutation::Upsert(snapshot) => snapshot.bulk_parent()?,
        Mutation::Delete { parent_uid, .. } => parent_uid.as_deref(),
    };
    if let Some(parent) = parent {
        meta.insert("_parent".to_string(), Value::String(parent.to_string()));
    }

    let mut line = Map::new();
    line.insert(action.as_str().to_string(), Value::Object(meta));
    out.push_str(&serde_json::to_string(&line)?);
    out.push('\n');

    if action.has_body() {
        if let Mutation::Upsert(snapshot) = mutation {
            out.push_str(&serde_json::to_string(&snapshot.document)?);
            out.push('\n');
        }
    }

    Ok(())
}
