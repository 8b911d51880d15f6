//! Generic property access for entities.
//!
//! Each entity type declares its fields once in a [`PropertyRegistry`]. A
//! [`Property`] carries optional getter and setter closures; a property
//! without a getter is not readable and one without a setter is not writable.
//! The registry is what the persistence layer uses to turn an entity into a
//! document body and to hydrate an entity from a fetched document.
//!
//! # Example
//!
//! ```
//! use entity_persistence::property::{Property, PropertyRegistry};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct User {
//!     name: String,
//!     created: String,
//! }
//!
//! let registry = PropertyRegistry::new("user")
//!     .with(Property::field("name", |u: &User| u.name.clone(), |u, v| u.name = v))
//!     .with(Property::read_only("created", |u: &User| u.created.clone()));
//!
//! let mut user = User::default();
//! registry.set_value(&mut user, "name", json!("john")).unwrap();
//! assert_eq!(user.name, "john");
//!
//! // Read-only properties reject writes
//! assert!(registry.set_value(&mut user, "created", json!("now")).is_err());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{PropertyError, PropertyResult};
use crate::types::DocumentPayload;

type Getter<E> = Box<dyn Fn(&E) -> PropertyResult<Value> + Send + Sync>;
type Setter<E> = Box<dyn Fn(&mut E, Value) -> PropertyResult<()> + Send + Sync>;

/// A single entity field with its access rules.
pub struct Property<E> {
    name: String,
    getter: Option<Getter<E>>,
    setter: Option<Setter<E>>,
    attributes: BTreeMap<String, String>,
}

impl<E> fmt::Debug for Property<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<E: 'static> Property<E> {
    /// Creates a readable and writable property.
    pub fn field<T, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
        G: Fn(&E) -> T + Send + Sync + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            getter: Some(Self::wrap_getter(name.clone(), get)),
            setter: Some(Self::wrap_setter(name.clone(), set)),
            name,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a property that can be read but not written.
    pub fn read_only<T, G>(name: impl Into<String>, get: G) -> Self
    where
        T: Serialize + 'static,
        G: Fn(&E) -> T + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            getter: Some(Self::wrap_getter(name.clone(), get)),
            setter: None,
            name,
            attributes: BTreeMap::new(),
        }
    }

    /// Creates a property that can be written but not read.
    ///
    /// Write-only properties never appear in serialized documents.
    pub fn write_only<T, S>(name: impl Into<String>, set: S) -> Self
    where
        T: DeserializeOwned + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            getter: None,
            setter: Some(Self::wrap_setter(name.clone(), set)),
            name,
            attributes: BTreeMap::new(),
        }
    }

    fn wrap_getter<T, G>(name: String, get: G) -> Getter<E>
    where
        T: Serialize + 'static,
        G: Fn(&E) -> T + Send + Sync + 'static,
    {
        Box::new(move |entity: &E| {
            serde_json::to_value(get(entity)).map_err(|e| PropertyError::InvalidValue {
                property: name.clone(),
                message: e.to_string(),
            })
        })
    }

    fn wrap_setter<T, S>(name: String, set: S) -> Setter<E>
    where
        T: DeserializeOwned + 'static,
        S: Fn(&mut E, T) + Send + Sync + 'static,
    {
        Box::new(move |entity: &mut E, value: Value| {
            let typed = serde_json::from_value::<T>(value).map_err(|e| {
                PropertyError::InvalidValue {
                    property: name.clone(),
                    message: e.to_string(),
                }
            })?;
            set(entity, typed);
            Ok(())
        })
    }
}

impl<E> Property<E> {
    /// Attaches a metadata attribute (for example a field type hint).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a metadata attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns all metadata attributes.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Returns `true` if the property can be read.
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Returns `true` if the property can be written.
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the property value from an entity.
    pub fn get(&self, entity: &E) -> PropertyResult<Value> {
        match &self.getter {
            Some(getter) => getter(entity),
            None => Err(PropertyError::NotReadable {
                property: self.name.clone(),
            }),
        }
    }

    /// Writes the property value on an entity.
    pub fn set(&self, entity: &mut E, value: Value) -> PropertyResult<()> {
        match &self.setter {
            Some(setter) => setter(entity, value),
            None => Err(PropertyError::NotWritable {
                property: self.name.clone(),
            }),
        }
    }
}

/// The ordered set of properties declared by one entity type.
pub struct PropertyRegistry<E> {
    entity_type: String,
    properties: Vec<Property<E>>,
    by_name: HashMap<String, usize>,
}

impl<E> fmt::Debug for PropertyRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("entity_type", &self.entity_type)
            .field("properties", &self.properties)
            .finish()
    }
}

impl<E> PropertyRegistry<E> {
    /// Creates an empty registry for an entity type.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            properties: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Adds a property, builder style.
    pub fn with(mut self, property: Property<E>) -> Self {
        self.register(property);
        self
    }

    /// Adds a property. A property with the same name is replaced in place.
    pub fn register(&mut self, property: Property<E>) {
        match self.by_name.get(property.name()) {
            Some(&index) => self.properties[index] = property,
            None => {
                self.by_name
                    .insert(property.name().to_string(), self.properties.len());
                self.properties.push(property);
            }
        }
    }

    /// Returns the entity type this registry describes.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the number of registered properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if no property is registered.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Looks up a property by name.
    pub fn get(&self, name: &str) -> Option<&Property<E>> {
        self.by_name.get(name).map(|&index| &self.properties[index])
    }

    /// Iterates over all properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Property<E>> {
        self.properties.iter()
    }

    /// Iterates over readable properties in declaration order.
    pub fn readable(&self) -> impl Iterator<Item = &Property<E>> {
        self.properties.iter().filter(|p| p.is_readable())
    }

    /// Iterates over writable properties in declaration order.
    pub fn writable(&self) -> impl Iterator<Item = &Property<E>> {
        self.properties.iter().filter(|p| p.is_writable())
    }

    fn lookup(&self, name: &str) -> PropertyResult<&Property<E>> {
        self.get(name).ok_or_else(|| PropertyError::UnknownProperty {
            entity_type: self.entity_type.clone(),
            property: name.to_string(),
        })
    }

    /// Reads a named property from an entity.
    pub fn get_value(&self, entity: &E, name: &str) -> PropertyResult<Value> {
        self.lookup(name)?.get(entity)
    }

    /// Writes a named property on an entity.
    pub fn set_value(&self, entity: &mut E, name: &str, value: Value) -> PropertyResult<()> {
        self.lookup(name)?.set(entity, value)
    }

    /// Serializes every readable property into a document body.
    pub fn read_document(&self, entity: &E) -> PropertyResult<DocumentPayload> {
        let mut document = DocumentPayload::new();
        for property in self.readable() {
            document.insert(property.name().to_string(), property.get(entity)?);
        }
        Ok(document)
    }

    /// Hydrates an entity from a document body.
    ///
    /// Keys naming a writable property are written; unknown and read-only
    /// keys are skipped.
    pub fn write_document(&self, entity: &mut E, document: &DocumentPayload) -> PropertyResult<()> {
        for (key, value) in document {
            if let Some(property) = self.get(key).filter(|p| p.is_writable()) {
                property.set(entity, value.clone())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Sample {
        title: String,
        views: u32,
        secret: Option<String>,
        created: String,
    }

    fn registry() -> PropertyRegistry<Sample> {
        PropertyRegistry::new("sample")
            .with(
                Property::field("title", |s: &Sample| s.title.clone(), |s, v| s.title = v)
                    .with_attribute("type", "string"),
            )
            .with(Property::field(
                "views",
                |s: &Sample| s.views,
                |s, v| s.views = v,
            ))
            .with(Property::write_only("secret", |s: &mut Sample, v| {
                s.secret = Some(v)
            }))
            .with(Property::read_only("created", |s: &Sample| s.created.clone()))
    }

    #[test]
    fn test_access_flags() {
        let registry = registry();
        let title = registry.get("title").unwrap();
        assert!(title.is_readable() && title.is_writable());
        assert_eq!(title.attribute("type"), Some("string"));

        let secret = registry.get("secret").unwrap();
        assert!(!secret.is_readable());
        assert!(secret.is_writable());

        let created = registry.get("created").unwrap();
        assert!(created.is_readable());
        assert!(!created.is_writable());

        assert_eq!(registry.readable().count(), 3);
        assert_eq!(registry.writable().count(), 3);
    }

    #[test]
    fn test_get_and_set() {
        let registry = registry();
        let mut sample = Sample::default();

        registry
            .set_value(&mut sample, "views", json!(12))
            .unwrap();
        assert_eq!(sample.views, 12);
        assert_eq!(registry.get_value(&sample, "views").unwrap(), json!(12));
    }

    #[test]
    fn test_access_denied() {
        let registry = registry();
        let mut sample = Sample::default();

        assert!(matches!(
            registry.get_value(&sample, "secret"),
            Err(PropertyError::NotReadable { .. })
        ));
        assert!(matches!(
            registry.set_value(&mut sample, "created", json!("2015-01-01")),
            Err(PropertyError::NotWritable { .. })
        ));
        assert!(matches!(
            registry.get_value(&sample, "missing"),
            Err(PropertyError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_invalid_value() {
        let registry = registry();
        let mut sample = Sample::default();
        let err = registry
            .set_value(&mut sample, "views", json!("many"))
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValue { ref property, .. } if property == "views"));
    }

    #[test]
    fn test_read_document_skips_unreadable() {
        let registry = registry();
        let sample = Sample {
            title: "hello".to_string(),
            views: 3,
            secret: Some("hidden".to_string()),
            created: "2015-01-01".to_string(),
        };

        let document = registry.read_document(&sample).unwrap();
        let keys: Vec<&str> = document.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        assert!(!document.contains_key("secret"));
        assert_eq!(document["title"], json!("hello"));
    }

    #[test]
    fn test_write_document_skips_read_only_and_unknown() {
        let registry = registry();
        let mut sample = Sample::default();
        let document = json!({
            "title": "fetched",
            "created": "2015-01-01",
            "uid": "abc",
            "secret": "s3"
        });

        registry
            .write_document(&mut sample, document.as_object().unwrap())
            .unwrap();
        assert_eq!(sample.title, "fetched");
        assert_eq!(sample.created, "");
        assert_eq!(sample.secret.as_deref(), Some("s3"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = registry();
        registry.register(Property::read_only("title", |_: &Sample| "fixed"));
        assert_eq!(registry.len(), 4);
        assert!(!registry.get("title").unwrap().is_writable());
        assert_eq!(
            registry.get_value(&Sample::default(), "title").unwrap(),
            json!("fixed")
        );
    }
}
