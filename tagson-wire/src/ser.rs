//! Wire serialization: `Value` trees to tagged JSON
//!
//! Mirrors the parser in reverse. The one non-obvious rule is escaping: an
//! object whose top-level keys collide with a sentinel name must be wrapped
//! under `@obj` before emission, or the receiver would misread it.
//!
//! Every tagged form is emitted through a named newtype struct (see
//! [`crate::sentinel::token`]). JSON serializers ignore the name, so the
//! bytes are exactly the sentinel forms; the mapper's encoder uses the name
//! to keep tagged variants tagged.

use serde::ser::{Error as _, Serialize, SerializeMap, Serializer};

use crate::bytes::Bytes;
use crate::refs::Ref;
use crate::sentinel::{
    is_sentinel_key, token, KEY_BYTES, KEY_DATE, KEY_OBJ, KEY_QUERY, KEY_REF, KEY_SET, KEY_TS,
};
use crate::time::{Date, Timestamp};
use crate::value::{Fields, Query, SetRef, Value};

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::String(text) => serializer.serialize_str(text),
            Value::Long(n) => serializer.serialize_i64(*n),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Array(items) => serializer.collect_seq(items),
            Value::Object(fields) => {
                serializer.serialize_newtype_struct(token::OBJECT, &Escaped(fields))
            }
            Value::Ref(r) => r.serialize(serializer),
            Value::SetRef(set) => set.serialize(serializer),
            Value::Timestamp(ts) => ts.serialize(serializer),
            Value::Date(date) => date.serialize(serializer),
            Value::Bytes(bytes) => bytes.serialize(serializer),
            Value::Query(query) => query.serialize(serializer),
        }
    }
}

impl Serialize for Ref {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(token::REF, &WireRef(self))
    }
}

impl Serialize for SetRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(token::SET, &TaggedFields(KEY_SET, &self.0))
    }
}

impl Serialize for Query {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(token::QUERY, &TaggedFields(KEY_QUERY, &self.0))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = self.to_rfc3339().map_err(S::Error::custom)?;
        serializer.serialize_newtype_struct(token::TS, &TaggedText(KEY_TS, &text))
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(token::DATE, &TaggedText(KEY_DATE, &self.to_iso()))
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_newtype_struct(token::BYTES, &TaggedText(KEY_BYTES, &self.to_base64()))
    }
}

/// Object body with the `@obj` escape applied when keys collide.
struct Escaped<'a>(&'a Fields);

impl Serialize for Escaped<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0.keys().any(|key| is_sentinel_key(key)) {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(KEY_OBJ, &PlainFields(self.0))?;
            map.end()
        } else {
            PlainFields(self.0).serialize(serializer)
        }
    }
}

/// Object body emitted as-is, keys in insertion order.
struct PlainFields<'a>(&'a Fields);

impl Serialize for PlainFields<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0)
    }
}

/// `{"<key>": {...escaped fields...}}`
struct TaggedFields<'a>(&'static str, &'a Fields);

impl Serialize for TaggedFields<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, &Escaped(self.1))?;
        map.end()
    }
}

/// `{"<key>": "<text>"}`
struct TaggedText<'a>(&'static str, &'a str);

impl Serialize for TaggedText<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

/// `{"@ref": {"id": ..., "collection"?: ..., "database"?: ...}}`
struct WireRef<'a>(&'a Ref);

impl Serialize for WireRef<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(KEY_REF, &RefBody(self.0))?;
        map.end()
    }
}

struct RefBody<'a>(&'a Ref);

impl Serialize for RefBody<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", self.0.id())?;
        if let Some(collection) = self.0.collection() {
            map.serialize_entry("collection", collection)?;
        }
        if let Some(database) = self.0.database() {
            map.serialize_entry("database", database)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::Native;
    use crate::to_string;

    fn obj(entries: Vec<(&str, Value)>) -> Value {
        let mut fields = Fields::new();
        for (key, value) in entries {
            fields.insert(key.to_string(), value);
        }
        Value::Object(fields)
    }

    #[test]
    fn test_scalars() {
        let cases = vec![
            (Value::Null, "null"),
            (Value::from(true), "true"),
            (Value::from(42i64), "42"),
            (Value::from(1.5), "1.5"),
            (Value::from("hi"), "\"hi\""),
        ];
        for (value, expected) in cases {
            assert_eq!(to_string(&value).unwrap(), expected);
        }
    }

    #[test]
    fn test_plain_object_keeps_insertion_order() {
        let value = obj(vec![
            ("z", Value::from(1i64)),
            ("a", Value::from(2i64)),
        ]);
        assert_eq!(to_string(&value).unwrap(), r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn test_colliding_keys_are_escaped_under_obj() {
        let value = obj(vec![("@ref", Value::from("not a ref"))]);
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"@obj":{"@ref":"not a ref"}}"#
        );
    }

    #[test]
    fn test_one_colliding_key_escapes_the_whole_object() {
        let value = obj(vec![
            ("name", Value::from("x")),
            ("@ts", Value::from("y")),
        ]);
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"@obj":{"name":"x","@ts":"y"}}"#
        );
    }

    #[test]
    fn test_ref_omits_absent_scopes() {
        let bare = Value::Ref(Ref::new("42"));
        assert_eq!(to_string(&bare).unwrap(), r#"{"@ref":{"id":"42"}}"#);

        let scoped = Value::Ref(Ref::scoped("1", Ref::scoped("people", Native::Classes.to_ref())));
        assert_eq!(
            to_string(&scoped).unwrap(),
            r#"{"@ref":{"id":"1","collection":{"@ref":{"id":"people","collection":{"@ref":{"id":"classes"}}}}}}"#
        );
    }

    #[test]
    fn test_timestamp_emits_nine_digits() {
        let value = Value::Timestamp(Timestamp::from_epoch_millis(302_010));
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"@ts":"1970-01-01T00:05:02.010000000Z"}"#
        );
    }

    #[test]
    fn test_date_and_bytes_forms() {
        let date = Value::Date(Date::from_ymd(2019, 2, 28).unwrap());
        assert_eq!(to_string(&date).unwrap(), r#"{"@date":"2019-02-28"}"#);

        let bytes = Value::Bytes(Bytes::new(vec![0xF8]));
        assert_eq!(to_string(&bytes).unwrap(), r#"{"@bytes":"-A=="}"#);
    }

    #[test]
    fn test_set_ref_parameters_are_escaped_like_objects() {
        let mut params = Fields::new();
        params.insert("match".to_string(), Value::Ref(Native::Indexes.to_ref()));
        let value = Value::SetRef(SetRef(params));
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"@set":{"match":{"@ref":{"id":"indexes"}}}}"#
        );
    }

    #[test]
    fn test_query_wraps_inner_expression() {
        let mut expr = Fields::new();
        expr.insert("lambda".to_string(), Value::from("x"));
        expr.insert("expr".to_string(), Value::from(1i64));
        let value = Value::Query(Query(expr));
        assert_eq!(
            to_string(&value).unwrap(),
            r#"{"@query":{"lambda":"x","expr":1}}"#
        );
    }
}
