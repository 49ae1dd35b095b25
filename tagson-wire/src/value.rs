//! The tagged value model

use indexmap::IndexMap;

use crate::bytes::Bytes;
use crate::refs::Ref;
use crate::time::{Date, Timestamp};

/// Insertion-ordered string-keyed fields, used by objects, set parameters,
/// and query expressions.
pub type Fields = IndexMap<String, Value>;

/// A value exchanged with the database.
///
/// This is a closed tagged union: every datum that crosses the wire is one of
/// these variants. Values are immutable once constructed and carry no
/// external resources.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent or null.
    Null,
    /// UTF-8 text.
    String(String),
    /// 64-bit signed integer; every host integer width widens to this.
    Long(i64),
    /// 64-bit float; every host float width widens to this.
    Double(f64),
    /// Boolean.
    Boolean(bool),
    /// Ordered sequence; order is significant and preserved.
    Array(Vec<Value>),
    /// Object with insertion-ordered unique keys.
    Object(Fields),
    /// Reference to a document, collection, or database.
    Ref(Ref),
    /// Opaque descriptor of a server-side set query.
    SetRef(SetRef),
    /// High-precision instant.
    Timestamp(Timestamp),
    /// Plain calendar date.
    Date(Date),
    /// Raw bytes.
    Bytes(Bytes),
    /// Opaque, unevaluated query expression literal.
    Query(Query),
}

/// Opaque set-query parameters; never expanded client-side.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRef(pub Fields);

/// An opaque, unevaluated expression literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Query(pub Fields);

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Ref(_) => "ref",
            Value::SetRef(_) => "set ref",
            Value::Timestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Bytes(_) => "bytes",
            Value::Query(_) => "query",
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// Read as a long.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Read as a double; longs widen.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Long(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Read as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as object fields.
    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Borrow as a reference.
    pub fn as_reference(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow as a timestamp.
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Borrow as a date.
    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Value::Date(date) => Some(date),
            _ => None,
        }
    }

    /// Borrow as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Long(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Value {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Value {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Value {
        Value::String(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::Array(items)
    }
}

impl From<Fields> for Value {
    fn from(fields: Fields) -> Value {
        Value::Object(fields)
    }
}

impl From<SetRef> for Value {
    fn from(set: SetRef) -> Value {
        Value::SetRef(set)
    }
}

impl From<Query> for Value {
    fn from(query: Query) -> Value {
        Value::Query(query)
    }
}
