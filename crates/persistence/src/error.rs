//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates store response errors, entity and
//! property errors, search errors, transaction errors and backend errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Document state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Entity precondition errors
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Property access errors
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Criterion translation errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Store responses that failed validation
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Transaction errors
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns `true` for failures that write operations degrade into a
    /// `false` result instead of propagating.
    pub fn is_recoverable_write_failure(&self) -> bool {
        matches!(
            self,
            StorageError::Response(_) | StorageError::Resource(ResourceError::NotFound { .. })
        )
    }
}

/// Errors related to document state in the store.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The document does not exist in the store.
    #[error("document not found: {entity_type}/{uid}")]
    NotFound { entity_type: String, uid: String },
}

/// Errors raised by entity preconditions, before any network call.
#[derive(Error, Debug)]
pub enum EntityError {
    /// A child entity was saved before its parent was persisted.
    #[error("parent of {entity_type} entity is not persisted")]
    ParentNotPersisted {
        entity_type: String,
        uid: Option<String>,
    },

    /// A child entity declares no parent reference where one is required.
    #[error("child {entity_type} entity has no parent reference")]
    MissingParent { entity_type: String },

    /// A mutation needs a document UID that the entity does not carry.
    #[error("{entity_type} entity has no uid")]
    MissingUid { entity_type: String },

    /// The UID cannot name a document in a request path.
    #[error("uid {uid:?} of {entity_type} entity cannot address a document")]
    InvalidUid { entity_type: String, uid: String },
}

/// Errors related to generic property access.
#[derive(Error, Debug)]
pub enum PropertyError {
    /// The property exists but cannot be read.
    #[error("property is not readable: {property}")]
    NotReadable { property: String },

    /// The property exists but cannot be written.
    #[error("property is not writable: {property}")]
    NotWritable { property: String },

    /// No property with that name is registered for the entity.
    #[error("unknown property {property} on {entity_type}")]
    UnknownProperty {
        entity_type: String,
        property: String,
    },

    /// The value could not be converted to the property's type.
    #[error("invalid value for property {property}: {message}")]
    InvalidValue { property: String, message: String },
}

/// Errors related to criterion translation.
#[derive(Error, Debug)]
pub enum SearchError {
    /// An empty collection was given as a criterion value.
    #[error("empty collection is not a valid criterion value")]
    EmptyCriterion,
}

/// A store response violated the response envelope invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponseError {
    /// The response carries a top-level `error` field.
    #[error("store returned an error: {error}")]
    TopLevelError { error: String },

    /// The response carries a `status` field other than 200.
    #[error("store returned non-success status {status}")]
    NonSuccessStatus { status: String },

    /// At least one shard failed to answer.
    #[error("{failed} shard(s) failed to give result")]
    ShardFailure { failed: u64 },
}

/// Errors related to transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The spool file could not be created, written or read.
    #[error("transaction spool error: {message}")]
    Spool {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// A spooled mutation could not be decoded.
    #[error("corrupt transaction entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    /// The mutation could not be encoded for spooling.
    #[error("mutation could not be encoded: {message}")]
    Encoding { message: String },
}

/// Errors originating from the store backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The transport failed to deliver the request or read the reply.
    #[error("transport failure on {backend_name}: {message}")]
    Transport {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend could not be configured.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for property access.
pub type PropertyResult<T> = Result<T, PropertyError>;

/// Result type alias for criterion translation.
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type alias for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}
