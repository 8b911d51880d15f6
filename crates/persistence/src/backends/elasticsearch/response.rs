//! Response validation and hit extraction.

use serde_json::Value;

use crate::error::{BackendError, ResponseError, StorageResult};
use crate::types::{DocumentPayload, UID_FIELD};

/// Checks a response envelope before anything else reads it.
///
/// Checks run in order and the first violation wins: a top-level `error`,
/// then a `status` other than 200, then failed shards.
pub fn validate_response(response: &Value) -> Result<(), ResponseError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(ResponseError::TopLevelError {
            error: match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        });
    }

    if let Some(status) = response.get("status").filter(|s| !s.is_null()) {
        if status.as_u64() != Some(200) {
            return Err(ResponseError::NonSuccessStatus {
                status: status.to_string(),
            });
        }
    }

    let failed = response
        .get("_shards")
        .and_then(|shards| shards.get("failed"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if failed > 0 {
        return Err(ResponseError::ShardFailure { failed });
    }

    Ok(())
}

/// Extracts the `_source` of every hit, in hit order, with `uid` set to the
/// hit's `_id`.
pub fn extract_documents(response: &Value) -> StorageResult<Vec<DocumentPayload>> {
    let hits = response
        .get("hits")
        .and_then(|hits| hits.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("response has no hits.hits array"))?;

    hits.iter()
        .enumerate()
        .map(|(position, hit)| {
            let id = hit
                .get("_id")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed(format!("hit {} has no _id", position)))?;

            let mut document = match hit.get("_source") {
                Some(Value::Object(source)) => source.clone(),
                None | Some(Value::Null) => DocumentPayload::new(),
                Some(_) => {
                    return Err(malformed(format!("hit {} has a non-object _source", position)));
                }
            };
            document.insert(UID_FIELD.to_string(), Value::String(id.to_string()));
            Ok(document)
        })
        .collect()
}

/// Reads the `count` of a `_count` response.
pub fn extract_count(response: &Value) -> StorageResult<u64> {
    response
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed("response has no count"))
}

fn malformed(message: impl Into<String>) -> crate::error::StorageError {
    BackendError::SerializationError {
        message: message.into(),
    }
    .into()
}
