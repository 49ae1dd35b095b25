//! The reserved sentinel table and its readers
//!
//! A sentinel is a reserved object key (`@ref`, `@ts`, ...) that changes how
//! the surrounding JSON object is interpreted. The full set lives in one
//! closed table here so every recognized wire form is centrally auditable.

use crate::bytes::Bytes;
use crate::error::CodecError;
use crate::refs::{Native, Ref};
use crate::time::{Date, Timestamp};
use crate::value::{Fields, Query, SetRef, Value};

/// Key introducing a reference.
pub const KEY_REF: &str = "@ref";
/// Key introducing a set descriptor.
pub const KEY_SET: &str = "@set";
/// Key introducing a timestamp literal.
pub const KEY_TS: &str = "@ts";
/// Key introducing a date literal.
pub const KEY_DATE: &str = "@date";
/// Key introducing a bytes literal.
pub const KEY_BYTES: &str = "@bytes";
/// Key introducing a query expression literal.
pub const KEY_QUERY: &str = "@query";
/// Key escaping a literal object whose keys collide with sentinels.
pub const KEY_OBJ: &str = "@obj";

/// Private serde newtype-struct names linking the wire impls to the mapper.
///
/// The wire `Serialize` impls wrap each tagged form in a newtype struct with
/// one of these names. JSON serializers pass newtype structs through
/// transparently, so the wire bytes are unaffected; the mapper's encoder
/// recognizes the names and rebuilds the tagged variant instead of flattening
/// it into a plain object.
pub mod token {
    /// Object body (carries the `@obj` escape decision).
    pub const OBJECT: &str = "$tagson::wire::Object";
    /// `Ref` wire form.
    pub const REF: &str = "$tagson::wire::Ref";
    /// `SetRef` wire form.
    pub const SET: &str = "$tagson::wire::SetRef";
    /// `Timestamp` wire form.
    pub const TS: &str = "$tagson::wire::Timestamp";
    /// `Date` wire form.
    pub const DATE: &str = "$tagson::wire::Date";
    /// `Bytes` wire form.
    pub const BYTES: &str = "$tagson::wire::Bytes";
    /// `Query` wire form.
    pub const QUERY: &str = "$tagson::wire::Query";
}

/// Closed table of recognized sentinel forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// `@ref`
    Ref,
    /// `@set`
    Set,
    /// `@ts`
    Ts,
    /// `@date`
    Date,
    /// `@bytes`
    Bytes,
    /// `@query`
    Query,
    /// `@obj`
    Obj,
}

impl Sentinel {
    /// Every sentinel, in table order.
    pub const ALL: [Sentinel; 7] = [
        Sentinel::Ref,
        Sentinel::Set,
        Sentinel::Ts,
        Sentinel::Date,
        Sentinel::Bytes,
        Sentinel::Query,
        Sentinel::Obj,
    ];

    /// The reserved key for this sentinel.
    pub fn key(self) -> &'static str {
        match self {
            Sentinel::Ref => KEY_REF,
            Sentinel::Set => KEY_SET,
            Sentinel::Ts => KEY_TS,
            Sentinel::Date => KEY_DATE,
            Sentinel::Bytes => KEY_BYTES,
            Sentinel::Query => KEY_QUERY,
            Sentinel::Obj => KEY_OBJ,
        }
    }

    /// Look a key up in the table.
    pub fn from_key(key: &str) -> Option<Sentinel> {
        Sentinel::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Interpret an already-parsed sentinel body into its tagged value.
    ///
    /// The body has been parsed with the normal recursive rules, so nested
    /// sentinel forms (e.g. a parent `@ref` inside `collection`) are already
    /// tagged variants by the time they get here.
    pub fn apply(self, body: Value) -> Result<Value, CodecError> {
        match self {
            Sentinel::Ref => build_ref(body).map(Value::Ref),
            Sentinel::Set => match body {
                Value::Object(fields) => Ok(Value::SetRef(SetRef(fields))),
                _ => Err(CodecError::MalformedSet),
            },
            Sentinel::Ts => match body {
                Value::String(text) => Timestamp::parse_rfc3339(&text).map(Value::Timestamp),
                _ => Err(CodecError::ExpectedString(KEY_TS)),
            },
            Sentinel::Date => match body {
                Value::String(text) => Date::parse(&text).map(Value::Date),
                _ => Err(CodecError::ExpectedString(KEY_DATE)),
            },
            Sentinel::Bytes => match body {
                Value::String(text) => Bytes::from_base64(&text).map(Value::Bytes),
                _ => Err(CodecError::ExpectedString(KEY_BYTES)),
            },
            Sentinel::Query => match body {
                Value::Object(fields) => Ok(Value::Query(Query(fields))),
                _ => Err(CodecError::MalformedQuery),
            },
            Sentinel::Obj => match body {
                Value::Object(fields) => Ok(Value::Object(fields)),
                _ => Err(CodecError::MalformedObj),
            },
        }
    }
}

/// Whether `key` collides with a reserved sentinel name.
pub fn is_sentinel_key(key: &str) -> bool {
    Sentinel::from_key(key).is_some()
}

fn build_ref(body: Value) -> Result<Ref, CodecError> {
    let Value::Object(mut fields) = body else {
        return Err(CodecError::MalformedRef("expected an object body".into()));
    };
    let id = match fields.shift_remove("id") {
        Some(Value::String(id)) => id,
        Some(_) => return Err(CodecError::MalformedRef("id must be a string".into())),
        None => return Err(CodecError::MalformedRef("missing id".into())),
    };
    let collection = take_sub_ref(&mut fields, "collection")?;
    let database = take_sub_ref(&mut fields, "database")?;

    // A bare id with no scope resolves against the native table first.
    if collection.is_none() && database.is_none() {
        if let Some(native) = Native::from_id(&id) {
            return Ok(native.to_ref());
        }
    }

    let mut reference = match collection {
        Some(collection) => Ref::scoped(id, collection),
        None => Ref::new(id),
    };
    if let Some(database) = database {
        reference = reference.in_database(database);
    }
    Ok(reference)
}

fn take_sub_ref(fields: &mut Fields, key: &str) -> Result<Option<Ref>, CodecError> {
    match fields.shift_remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Ref(r)) => Ok(Some(r)),
        Some(other) => Err(CodecError::MalformedRef(format!(
            "{} must be a reference, found {}",
            key,
            other.type_name()
        ))),
    }
}

impl Value {
    /// Lower the outermost tagged variant into the sentinel object it is
    /// written as on the wire; plain variants pass through unchanged. Only
    /// one level is lowered; nested values stay tagged.
    pub fn into_sentinel_form(self) -> Result<Value, CodecError> {
        Ok(match self {
            Value::Ref(r) => singleton(KEY_REF, Value::Object(ref_body(r))),
            Value::SetRef(SetRef(fields)) => singleton(KEY_SET, Value::Object(fields)),
            Value::Timestamp(ts) => singleton(KEY_TS, Value::String(ts.to_rfc3339()?)),
            Value::Date(date) => singleton(KEY_DATE, Value::String(date.to_iso())),
            Value::Bytes(bytes) => singleton(KEY_BYTES, Value::String(bytes.to_base64())),
            Value::Query(Query(fields)) => singleton(KEY_QUERY, Value::Object(fields)),
            plain => plain,
        })
    }
}

fn singleton(key: &str, inner: Value) -> Value {
    let mut fields = Fields::new();
    fields.insert(key.to_string(), inner);
    Value::Object(fields)
}

fn ref_body(reference: Ref) -> Fields {
    let mut fields = Fields::new();
    fields.insert("id".to_string(), Value::String(reference.id().to_string()));
    if let Some(collection) = reference.collection() {
        fields.insert("collection".to_string(), Value::Ref(collection.clone()));
    }
    if let Some(database) = reference.database() {
        fields.insert("database".to_string(), Value::Ref(database.clone()));
    }
    fields
}
