//! Document references and the native ref table

use crate::value::Value;

/// A reference forming a parent-scope chain of id → collection → database.
///
/// Two refs are equal iff their `id`, `collection`, and `database` are
/// structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref {
    id: String,
    collection: Option<Box<Ref>>,
    database: Option<Box<Ref>>,
}

impl Ref {
    /// Bare ref with no parent scope.
    pub fn new(id: impl Into<String>) -> Self {
        Ref {
            id: id.into(),
            collection: None,
            database: None,
        }
    }

    /// Document ref scoped to a collection.
    pub fn scoped(id: impl Into<String>, collection: Ref) -> Self {
        Ref {
            id: id.into(),
            collection: Some(Box::new(collection)),
            database: None,
        }
    }

    /// Attach a database scope.
    pub fn in_database(mut self, database: Ref) -> Self {
        self.database = Some(Box::new(database));
        self
    }

    /// The ref's own id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parent collection, if any.
    pub fn collection(&self) -> Option<&Ref> {
        self.collection.as_deref()
    }

    /// Parent database, if any.
    pub fn database(&self) -> Option<&Ref> {
        self.database.as_deref()
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Value {
        Value::Ref(r)
    }
}

/// Well-known root refs addressed by reserved ids.
///
/// These are canonical singletons: a bare `{"@ref":{"id":"classes"}}` on the
/// wire resolves to `Native::Classes` rather than an arbitrary user ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Native {
    /// All classes in the database.
    Classes,
    /// All child databases.
    Databases,
    /// All indexes.
    Indexes,
    /// All functions.
    Functions,
    /// All keys.
    Keys,
    /// All tokens.
    Tokens,
    /// All credentials.
    Credentials,
}

impl Native {
    /// Every native ref, in table order.
    pub const ALL: [Native; 7] = [
        Native::Classes,
        Native::Databases,
        Native::Indexes,
        Native::Functions,
        Native::Keys,
        Native::Tokens,
        Native::Credentials,
    ];

    /// The reserved id this native ref is addressed by.
    pub fn id(self) -> &'static str {
        match self {
            Native::Classes => "classes",
            Native::Databases => "databases",
            Native::Indexes => "indexes",
            Native::Functions => "functions",
            Native::Keys => "keys",
            Native::Tokens => "tokens",
            Native::Credentials => "credentials",
        }
    }

    /// Look an id up in the native table.
    pub fn from_id(id: &str) -> Option<Native> {
        Native::ALL.into_iter().find(|native| native.id() == id)
    }

    /// The canonical root ref for this entry.
    pub fn to_ref(self) -> Ref {
        Ref::new(self.id())
    }
}

impl From<Native> for Ref {
    fn from(native: Native) -> Ref {
        native.to_ref()
    }
}
