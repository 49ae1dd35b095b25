//! Wire parsing: tagged JSON to `Value` trees
//!
//! A single recursive descent over the JSON token stream. Objects are
//! disambiguated by their first key: a reserved sentinel key dispatches
//! through the closed table in [`crate::sentinel`], anything else reads as a
//! plain object in encounter order. A sentinel is only honored as the sole
//! key; trailing fields after one are a fatal parse error, as is any
//! structurally malformed input (no recovery is attempted).

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use crate::bytes::Bytes;
use crate::refs::Ref;
use crate::sentinel::Sentinel;
use crate::time::{Date, Timestamp};
use crate::value::{Fields, Query, SetRef, Value};

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(WireVisitor)
    }
}

struct WireVisitor;

impl<'de> Visitor<'de> for WireVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a wire protocol value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Long(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E>
    where
        E: de::Error,
    {
        i64::try_from(v)
            .map(Value::Long)
            .map_err(|_| E::custom(crate::error::CodecError::IntegerOutOfRange(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(Bytes::new(v)))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Bytes(Bytes::new(v)))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let first = match map.next_key::<String>()? {
            Some(key) => key,
            None => return Ok(Value::Object(Fields::new())),
        };
        match Sentinel::from_key(&first) {
            Some(Sentinel::Obj) => {
                let PlainObject(fields) = map.next_value()?;
                reject_trailing(&mut map, &first)?;
                Ok(Value::Object(fields))
            }
            Some(sentinel) => {
                let body: Value = map.next_value()?;
                reject_trailing(&mut map, &first)?;
                sentinel.apply(body).map_err(de::Error::custom)
            }
            None => {
                let mut fields = Fields::new();
                fields.insert(first, map.next_value()?);
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    fields.insert(key, value);
                }
                Ok(Value::Object(fields))
            }
        }
    }
}

fn reject_trailing<'de, A>(map: &mut A, sentinel: &str) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
{
    match map.next_key::<IgnoredAny>()? {
        Some(_) => Err(de::Error::custom(format!(
            "unexpected field after sentinel `{}`",
            sentinel
        ))),
        None => Ok(()),
    }
}

/// Object body read without sentinel dispatch for its top-level keys; the
/// values themselves still parse with the normal rules.
struct PlainObject(Fields);

impl<'de> Deserialize<'de> for PlainObject {
    fn deserialize<D>(deserializer: D) -> Result<PlainObject, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PlainVisitor;

        impl<'de> Visitor<'de> for PlainVisitor {
            type Value = PlainObject;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an escaped object body")
            }

            fn visit_map<A>(self, mut map: A) -> Result<PlainObject, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Fields::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    fields.insert(key, value);
                }
                Ok(PlainObject(fields))
            }
        }

        deserializer.deserialize_map(PlainVisitor)
    }
}

// The tagged leaf types deserialize from their own sentinel forms, so host
// structs can carry them as ordinary fields.

macro_rules! leaf_deserialize {
    ($type:ident, $variant:ident, $expected:literal) => {
        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<$type, D::Error>
            where
                D: Deserializer<'de>,
            {
                match Value::deserialize(deserializer)? {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(de::Error::custom(format!(
                        concat!("expected ", $expected, ", found {}"),
                        other.type_name()
                    ))),
                }
            }
        }
    };
}

leaf_deserialize!(Ref, Ref, "a reference");
leaf_deserialize!(SetRef, SetRef, "a set ref");
leaf_deserialize!(Timestamp, Timestamp, "a timestamp");
leaf_deserialize!(Date, Date, "a date");
leaf_deserialize!(Bytes, Bytes, "a bytes literal");
leaf_deserialize!(Query, Query, "a query literal");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::Native;
    use crate::{parse_str, to_string};

    #[test]
    fn test_scalars_and_arrays() {
        let value = parse_str(r#"[null,true,1,2.5,"x"]"#).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Null,
                Value::from(true),
                Value::from(1i64),
                Value::from(2.5),
                Value::from("x"),
            ])
        );
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(parse_str("{}").unwrap(), Value::Object(Fields::new()));
    }

    #[test]
    fn test_plain_object_preserves_key_order() {
        let value = parse_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_native_ref_resolves_to_singleton() {
        let value = parse_str(r#"{"@ref":{"id":"classes"}}"#).unwrap();
        assert_eq!(value, Value::Ref(Native::Classes.to_ref()));
    }

    #[test]
    fn test_nested_ref_chain() {
        let value = parse_str(
            r#"{"@ref":{"id":"1","collection":{"@ref":{"id":"people","collection":{"@ref":{"id":"classes"}}}}}}"#,
        )
        .unwrap();
        assert_eq!(
            value,
            Value::Ref(Ref::scoped(
                "1",
                Ref::scoped("people", Native::Classes.to_ref())
            ))
        );
    }

    #[test]
    fn test_ref_missing_id_is_fatal() {
        let err = parse_str(r#"{"@ref":{"collection":{"@ref":{"id":"classes"}}}}"#).unwrap_err();
        assert!(err.to_string().contains("malformed reference"));
    }

    #[test]
    fn test_obj_escape_bypasses_sentinel_dispatch() {
        let value = parse_str(r#"{"@obj":{"@ref":"just text"}}"#).unwrap();
        let mut expected = Fields::new();
        expected.insert("@ref".to_string(), Value::from("just text"));
        assert_eq!(value, Value::Object(expected));
    }

    #[test]
    fn test_obj_escape_only_covers_top_level_keys() {
        // A nested ref inside an escaped object still parses as a ref.
        let value = parse_str(r#"{"@obj":{"@set":"text","link":{"@ref":{"id":"keys"}}}}"#).unwrap();
        let fields = value.as_object().unwrap();
        assert_eq!(fields.get("@set"), Some(&Value::from("text")));
        assert_eq!(
            fields.get("link"),
            Some(&Value::Ref(Native::Keys.to_ref()))
        );
    }

    #[test]
    fn test_trailing_field_after_sentinel_is_fatal() {
        let err = parse_str(r#"{"@ts":"1970-01-01T00:00:00Z","extra":1}"#).unwrap_err();
        assert!(err.to_string().contains("unexpected field after sentinel"));
    }

    #[test]
    fn test_set_and_query_wrappers() {
        let value = parse_str(r#"{"@set":{"match":{"@ref":{"id":"indexes"}}}}"#).unwrap();
        let Value::SetRef(SetRef(params)) = value else {
            panic!("expected a set ref");
        };
        assert_eq!(
            params.get("match"),
            Some(&Value::Ref(Native::Indexes.to_ref()))
        );

        let value = parse_str(r#"{"@query":{"lambda":"x","expr":true}}"#).unwrap();
        let Value::Query(Query(expr)) = value else {
            panic!("expected a query");
        };
        assert_eq!(expr.get("lambda"), Some(&Value::from("x")));
    }

    #[test]
    fn test_timestamp_and_date_literals() {
        let value = parse_str(r#"{"@ts":"1970-01-01T00:05:02.010000000Z"}"#).unwrap();
        assert_eq!(
            value,
            Value::Timestamp(Timestamp::from_epoch_millis(302_010))
        );

        let value = parse_str(r#"{"@date":"1970-01-03"}"#).unwrap();
        assert_eq!(value, Value::Date(Date::from_ymd(1970, 1, 3).unwrap()));
    }

    #[test]
    fn test_bad_literals_are_fatal() {
        let invalid = vec![
            r#"{"@ts":"not a time"}"#,
            r#"{"@ts":42}"#,
            r#"{"@date":"2019-02-30"}"#,
            r#"{"@bytes":"+A=="}"#,
            r#"{"@set":"scalar"}"#,
            r#"{"@query":[1,2]}"#,
            r#"{"@obj":17}"#,
        ];
        for text in invalid {
            assert!(parse_str(text).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_structurally_malformed_input_is_fatal() {
        let invalid = vec!["", "{", r#"{"a":}"#, "[1,", r#"{"a" 1}"#, "nul"];
        for text in invalid {
            assert!(parse_str(text).is_err(), "{}", text);
        }
    }

    #[test]
    fn test_large_unsigned_is_out_of_range() {
        let err = parse_str("18446744073709551615").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_leaf_types_deserialize_from_wire_text() {
        let reference: Ref =
            serde_json::from_str(r#"{"@ref":{"id":"people","collection":{"@ref":{"id":"classes"}}}}"#)
                .unwrap();
        assert_eq!(reference, Ref::scoped("people", Native::Classes.to_ref()));

        let ts: Timestamp = serde_json::from_str(r#"{"@ts":"1970-01-01T00:00:01Z"}"#).unwrap();
        assert_eq!(ts, Timestamp::from_epoch_seconds(1));

        let err = serde_json::from_str::<Date>(r#"{"@ts":"1970-01-01T00:00:01Z"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_serialize_parse_is_identity_on_wire_text() {
        let inputs = vec![
            r#"{"a":1,"b":[true,null],"c":{"d":"x"}}"#,
            r#"{"@ref":{"id":"1","collection":{"@ref":{"id":"people","collection":{"@ref":{"id":"classes"}}}}}}"#,
            r#"{"@ts":"1970-01-01T00:05:02.010000000Z"}"#,
            r#"{"@date":"2019-02-28"}"#,
            r#"{"@bytes":"-A=="}"#,
            r#"{"@obj":{"@query":"literal key"}}"#,
        ];
        for input in inputs {
            let value = parse_str(input).unwrap();
            assert_eq!(to_string(&value).unwrap(), input, "{}", input);
        }
    }
}
