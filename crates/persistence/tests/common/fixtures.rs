//! Sample entities for persistence layer testing.

use std::sync::LazyLock;

use entity_persistence::core::{Entity, EntityState, ParentRef};
use entity_persistence::property::{Property, PropertyRegistry};
use entity_persistence::types::DocumentPayload;
use serde_json::Value;

/// A top-level entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub uid: Option<String>,
    pub state: EntityState,
    pub name: String,
    pub age: u32,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub created: String,
}

static USER_PROPERTIES: LazyLock<PropertyRegistry<User>> = LazyLock::new(|| {
    PropertyRegistry::new("user")
        .with(
            Property::field("name", |u: &User| u.name.clone(), |u, v| u.name = v)
                .with_attribute("type", "string"),
        )
        .with(
            Property::field("age", |u: &User| u.age, |u, v| u.age = v)
                .with_attribute("type", "integer"),
        )
        .with(Property::field(
            "email",
            |u: &User| u.email.clone(),
            |u, v| u.email = v,
        ))
        .with(Property::write_only("password_hash", |u: &mut User, v| {
            u.password_hash = Some(v)
        }))
        .with(Property::read_only("created", |u: &User| u.created.clone()))
});

impl User {
    /// Creates a new, unsaved user.
    pub fn new(name: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            age,
            created: "2015-01-01T00:00:00Z".to_string(),
            ..Default::default()
        }
    }

    /// Marks the user as stored under `uid`.
    pub fn persisted(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self.state = EntityState::Persisted;
        self
    }

    /// Hydrates a user from a fetched document.
    pub fn from_document(document: &DocumentPayload) -> Self {
        let mut user = User::default();
        User::properties()
            .write_document(&mut user, document)
            .expect("valid user document");
        user.uid = document
            .get("uid")
            .and_then(Value::as_str)
            .map(str::to_string);
        user.state = EntityState::Persisted;
        user
    }
}

impl Entity for User {
    const TYPE: &'static str = "user";

    fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    fn state(&self) -> EntityState {
        self.state
    }

    fn properties() -> &'static PropertyRegistry<Self> {
        &USER_PROPERTIES
    }
}

/// A child entity routed through its author.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub uid: Option<String>,
    pub state: EntityState,
    pub text: String,
    pub author: Option<ParentRef>,
}

static COMMENT_PROPERTIES: LazyLock<PropertyRegistry<Comment>> = LazyLock::new(|| {
    PropertyRegistry::new("comment").with(Property::field(
        "text",
        |c: &Comment| c.text.clone(),
        |c, v| c.text = v,
    ))
});

impl Comment {
    /// Creates a new comment by `author`.
    pub fn by(author: &User, text: &str) -> Self {
        let author = match (&author.uid, author.state) {
            (Some(uid), EntityState::Persisted) => ParentRef::persisted(uid.clone()),
            (uid, _) => ParentRef::unsaved(uid.clone()),
        };
        Self {
            text: text.to_string(),
            author: Some(author),
            ..Default::default()
        }
    }

    /// Sets the comment UID.
    pub fn with_uid(mut self, uid: &str) -> Self {
        self.uid = Some(uid.to_string());
        self
    }
}

impl Entity for Comment {
    const TYPE: &'static str = "comment";
    const IS_CHILD: bool = true;

    fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    fn state(&self) -> EntityState {
        self.state
    }

    fn parent(&self) -> Option<ParentRef> {
        self.author.clone()
    }

    fn properties() -> &'static PropertyRegistry<Self> {
        &COMMENT_PROPERTIES
    }
}
