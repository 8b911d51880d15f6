//! Entity collaborator interface.
//!
//! The persistence layer does not own entity lifecycles. It only needs an
//! entity's type tag, UID, lifecycle state, child flag and parent reference,
//! plus a [`PropertyRegistry`] to read its fields. [`EntitySnapshot`] is the
//! owned, serializable capture of all of that at a point in time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EntityError, PropertyResult};
use crate::property::PropertyRegistry;
use crate::types::DocumentPayload;

/// Lifecycle state of an entity.
///
/// Encoded as lowercase strings; decoding any other value fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    /// Not yet written to the store.
    #[default]
    New,
    /// Written to the store at least once.
    Persisted,
    /// Marked for removal.
    Deleted,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityState::New => write!(f, "new"),
            EntityState::Persisted => write!(f, "persisted"),
            EntityState::Deleted => write!(f, "deleted"),
        }
    }
}

/// Reference from a child entity to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParentRef {
    /// The parent's UID, if it has one.
    pub uid: Option<String>,
    /// Whether the parent has been written to the store.
    pub persisted: bool,
}

impl ParentRef {
    /// A parent that is already stored under `uid`.
    pub fn persisted(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            persisted: true,
        }
    }

    /// A parent that has not been written yet.
    pub fn unsaved(uid: Option<String>) -> Self {
        Self {
            uid,
            persisted: false,
        }
    }

    /// Returns the parent UID when the parent is persisted.
    pub fn persisted_uid(&self) -> Option<&str> {
        if self.persisted {
            self.uid.as_deref()
        } else {
            None
        }
    }
}

/// An entity that can be mapped onto a store document.
///
/// # Example
///
/// ```
/// use std::sync::LazyLock;
///
/// use entity_persistence::core::{Entity, EntityState};
/// use entity_persistence::property::{Property, PropertyRegistry};
///
/// #[derive(Default)]
/// struct Tag {
///     uid: Option<String>,
///     label: String,
/// }
///
/// static TAG_PROPERTIES: LazyLock<PropertyRegistry<Tag>> = LazyLock::new(|| {
///     PropertyRegistry::new("tag")
///         .with(Property::field("label", |t: &Tag| t.label.clone(), |t, v| t.label = v))
/// });
///
/// impl Entity for Tag {
///     const TYPE: &'static str = "tag";
///
///     fn uid(&self) -> Option<&str> {
///         self.uid.as_deref()
///     }
///
///     fn state(&self) -> EntityState {
///         EntityState::New
///     }
///
///     fn properties() -> &'static PropertyRegistry<Self> {
///         &TAG_PROPERTIES
///     }
/// }
///
/// let tag = Tag { uid: None, label: "rust".to_string() };
/// let snapshot = tag.snapshot().unwrap();
/// assert_eq!(snapshot.entity_type, "tag");
/// assert_eq!(snapshot.document["label"], "rust");
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    /// Store type tag, fixed per entity class.
    const TYPE: &'static str;

    /// Whether entities of this class are routed through a parent.
    const IS_CHILD: bool = false;

    /// Returns the document UID, if one has been assigned.
    fn uid(&self) -> Option<&str>;

    /// Returns the lifecycle state.
    fn state(&self) -> EntityState;

    /// Returns the parent reference of a child entity.
    fn parent(&self) -> Option<ParentRef> {
        None
    }

    /// Returns the property registry of this entity class.
    fn properties() -> &'static PropertyRegistry<Self>;

    /// Captures the entity as an owned snapshot.
    fn snapshot(&self) -> PropertyResult<EntitySnapshot> {
        let document = Self::properties().read_document(self)?;
        Ok(EntitySnapshot {
            entity_type: Self::TYPE.to_string(),
            uid: self.uid().map(str::to_string),
            state: self.state(),
            is_child: Self::IS_CHILD,
            parent: if Self::IS_CHILD { self.parent() } else { None },
            document,
        })
    }
}

/// An owned capture of an entity, as handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Store type tag.
    pub entity_type: String,
    /// Document UID, absent for entities the store has not numbered yet.
    #[serde(default)]
    pub uid: Option<String>,
    /// Lifecycle state when the snapshot was taken.
    #[serde(default)]
    pub state: EntityState,
    /// Whether the entity is routed through a parent.
    #[serde(default)]
    pub is_child: bool,
    /// Parent reference of a child entity.
    #[serde(default)]
    pub parent: Option<ParentRef>,
    /// Serialized readable fields.
    #[serde(default)]
    pub document: DocumentPayload,
}

impl EntitySnapshot {
    /// Creates a snapshot of a new, parentless entity.
    pub fn new(entity_type: impl Into<String>, document: DocumentPayload) -> Self {
        Self {
            entity_type: entity_type.into(),
            uid: None,
            state: EntityState::New,
            is_child: false,
            parent: None,
            document,
        }
    }

    /// Sets the UID.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Sets the lifecycle state.
    pub fn with_state(mut self, state: EntityState) -> Self {
        self.state = state;
        self
    }

    /// Marks the snapshot as a child of `parent`.
    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.is_child = true;
        self.parent = Some(parent);
        self
    }

    /// Returns true if the entity has been written to the store.
    pub fn is_persisted(&self) -> bool {
        self.state == EntityState::Persisted
    }

    /// Returns true if the entity is marked for removal.
    pub fn is_deleted(&self) -> bool {
        self.state == EntityState::Deleted
    }

    /// Resolves the parent UID to route a single-document write through.
    ///
    /// A child with a parent reference requires that parent to be persisted.
    /// Returns `None` for parentless entities.
    pub fn routing_parent(&self) -> Result<Option<&str>, EntityError> {
        match (&self.parent, self.is_child) {
            (Some(parent), true) => match parent.persisted_uid() {
                Some(uid) => Ok(Some(uid)),
                None => Err(EntityError::ParentNotPersisted {
                    entity_type: self.entity_type.clone(),
                    uid: self.uid.clone(),
                }),
            },
            _ => Ok(None),
        }
    }

    /// Resolves the parent UID for a bulk action line.
    ///
    /// Within a batch the parent may be indexed earlier in the same payload,
    /// so only a UID is required here, not the persisted flag.
    pub fn bulk_parent(&self) -> Result<Option<&str>, EntityError> {
        if !self.is_child {
            return Ok(None);
        }
        match &self.parent {
            Some(ParentRef { uid: Some(uid), .. }) => Ok(Some(uid)),
            Some(_) => Err(EntityError::ParentNotPersisted {
                entity_type: self.entity_type.clone(),
                uid: self.uid.clone(),
            }),
            None => Err(EntityError::MissingParent {
                entity_type: self.entity_type.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> DocumentPayload {
        json!({"title": "hello"}).as_object().cloned().unwrap()
    }

    #[test]
    fn test_state_encoding() {
        assert_eq!(
            serde_json::to_value(EntityState::Persisted).unwrap(),
            json!("persisted")
        );
        assert_eq!(
            serde_json::from_value::<EntityState>(json!("deleted")).unwrap(),
            EntityState::Deleted
        );
        assert!(serde_json::from_value::<EntityState>(json!("zombie")).is_err());
        assert!(serde_json::from_value::<EntityState>(json!(-1)).is_err());
    }

    #[test]
    fn test_parentless_routing() {
        let snapshot = EntitySnapshot::new("post", doc()).with_uid("p1");
        assert_eq!(snapshot.routing_parent().unwrap(), None);
        assert_eq!(snapshot.bulk_parent().unwrap(), None);
    }

    #[test]
    fn test_child_with_persisted_parent() {
        let snapshot =
            EntitySnapshot::new("comment", doc()).with_parent(ParentRef::persisted("p1"));
        assert_eq!(snapshot.routing_parent().unwrap(), Some("p1"));
        assert_eq!(snapshot.bulk_parent().unwrap(), Some("p1"));
    }

    #[test]
    fn test_child_with_unsaved_parent() {
        let snapshot = EntitySnapshot::new("comment", doc())
            .with_parent(ParentRef::unsaved(Some("p1".to_string())));
        assert!(matches!(
            snapshot.routing_parent(),
            Err(EntityError::ParentNotPersisted { .. })
        ));
        // Bulk routing only needs the UID
        assert_eq!(snapshot.bulk_parent().unwrap(), Some("p1"));

        let snapshot =
            EntitySnapshot::new("comment", doc()).with_parent(ParentRef::unsaved(None));
        assert!(snapshot.routing_parent().is_err());
        assert!(snapshot.bulk_parent().is_err());
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = EntitySnapshot::new("comment", doc())
            .with_uid("c1")
            .with_state(EntityState::Persisted)
            .with_parent(ParentRef::persisted("p1"));

        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: EntitySnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
        assert!(decoded.is_persisted());
    }
}
