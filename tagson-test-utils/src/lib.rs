//! Tagson Test Utilities
//!
//! Shared fixtures and builders for the tagson test suites.

use tagson_wire::{Bytes, Date, Fields, Native, Ref, Timestamp, Value};

/// Builder for assembling `Object` values with common field patterns.
pub struct ObjectBuilder {
    fields: Fields,
}

impl ObjectBuilder {
    /// Create a new object builder.
    pub fn new() -> Self {
        Self {
            fields: Fields::new(),
        }
    }

    /// Add a string field.
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    /// Add a long field.
    pub fn long(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    /// Add a double field.
    pub fn double(mut self, key: &str, value: f64) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    /// Add a boolean field.
    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::from(value));
        self
    }

    /// Add a null field.
    pub fn null(mut self, key: &str) -> Self {
        self.fields.insert(key.to_string(), Value::Null);
        self
    }

    /// Add any value field.
    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Finish as an `Object` value.
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// Finish as raw fields.
    pub fn build_fields(self) -> Fields {
        self.fields
    }
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A document exercising every tagged variant, nested containers included.
pub fn sample_document() -> Value {
    ObjectBuilder::new()
        .value(
            "ref",
            Value::Ref(Ref::scoped("1", Ref::scoped("people", Native::Classes.to_ref()))),
        )
        .string("name", "Ada")
        .long("age", 36)
        .double("score", 99.5)
        .bool("active", true)
        .null("nickname")
        .value(
            "tags",
            Value::Array(vec![Value::from("a"), Value::from("b")]),
        )
        .value(
            "joined",
            Value::Timestamp(Timestamp::from_epoch_millis(302_010)),
        )
        .value("birthday", Value::Date(Date::from_ymd(1990, 12, 25).unwrap()))
        .value("avatar", Value::Bytes(Bytes::new(vec![0xF8, 0x01, 0x02])))
        .value(
            "meta",
            ObjectBuilder::new().string("source", "import").build(),
        )
        .build()
}

/// The exact wire text `sample_document` serializes to.
pub fn sample_document_text() -> &'static str {
    concat!(
        r#"{"ref":{"@ref":{"id":"1","collection":{"@ref":{"id":"people","collection":{"@ref":{"id":"classes"}}}}}},"#,
        r#""name":"Ada","age":36,"score":99.5,"active":true,"nickname":null,"#,
        r#""tags":["a","b"],"joined":{"@ts":"1970-01-01T00:05:02.010000000Z"},"#,
        r#""birthday":{"@date":"1990-12-25"},"avatar":{"@bytes":"-AEC"},"#,
        r#""meta":{"source":"import"}}"#
    )
}

/// One value of every plain (non-tagged) variant.
pub fn plain_values() -> Vec<Value> {
    vec![
        Value::Null,
        Value::from("text"),
        Value::from(42i64),
        Value::from(2.5),
        Value::from(false),
        Value::Array(vec![Value::from(1i64), Value::Null]),
        ObjectBuilder::new().string("k", "v").build(),
    ]
}

/// One value of every tagged variant.
pub fn tagged_values() -> Vec<Value> {
    vec![
        Value::Ref(Native::Databases.to_ref()),
        Value::SetRef(tagson_wire::SetRef(
            ObjectBuilder::new()
                .value("match", Value::Ref(Native::Indexes.to_ref()))
                .build_fields(),
        )),
        Value::Timestamp(Timestamp::new(1_000, 5)),
        Value::Date(Date::from_ymd(2020, 2, 29).unwrap()),
        Value::Bytes(Bytes::new(vec![0xDE, 0xAD])),
        Value::Query(tagson_wire::Query(
            ObjectBuilder::new().string("lambda", "x").build_fields(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_document_covers_every_variant() {
        let document = sample_document();
        let fields = document.as_object().unwrap();
        assert_eq!(fields.len(), 11);
        assert!(fields.get("ref").unwrap().as_reference().is_some());
        assert!(fields.get("joined").unwrap().as_timestamp().is_some());
        assert!(fields.get("nickname").unwrap().is_null());
    }
}
