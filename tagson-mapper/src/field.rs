//! Path-based access into `Value` trees
//!
//! A [`FieldPath`] names a location inside a document by a chain of object
//! keys and array indexes. Paths render with `/` separators ("data/tags/0")
//! and a failed lookup reports the prefix up to and including the segment
//! that was not found.

use serde::de::DeserializeOwned;
use tagson_wire::{DecodeError, Value};

use crate::decode::from_value;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object key lookup.
    Key(String),
    /// Array index lookup.
    Index(usize),
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A chain of lookups into a `Value` tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The empty path, naming the root value itself.
    pub fn root() -> Self {
        FieldPath::default()
    }

    /// Start a path at an object key.
    pub fn field(key: impl Into<String>) -> Self {
        FieldPath::root().at_field(key)
    }

    /// Extend the path with an object key.
    pub fn at_field(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    /// Extend the path with an array index.
    pub fn at_index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    /// The segments of this path in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn render(&self, len: usize) -> String {
        self.segments[..len]
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Follow the path through `value`, returning the value it names.
    pub fn extract<'a>(&self, value: &'a Value) -> Result<&'a Value, DecodeError> {
        let mut current = value;
        for (pos, segment) in self.segments.iter().enumerate() {
            let next = match segment {
                Segment::Key(key) => current.as_object().and_then(|fields| fields.get(key)),
                Segment::Index(index) => current.as_array().and_then(|items| items.get(*index)),
            };
            current = next.ok_or_else(|| DecodeError::PathMissing(self.render(pos + 1)))?;
        }
        Ok(current)
    }

    /// Extract the value at this path and decode it into `T`.
    pub fn get<T>(&self, value: &Value) -> Result<T, DecodeError>
    where
        T: DeserializeOwned,
    {
        from_value(self.extract(value)?.clone())
    }

    /// Extract an array at this path and decode every element into `T`.
    pub fn collect<T>(&self, value: &Value) -> Result<Vec<T>, DecodeError>
    where
        T: DeserializeOwned,
    {
        let target = self.extract(value)?;
        let items = target
            .as_array()
            .ok_or_else(|| DecodeError::NotAnArray(self.render(self.segments.len())))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                from_value(item.clone()).map_err(|source| DecodeError::Index {
                    index,
                    source: Box::new(source),
                })
            })
            .collect()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(self.segments.len()))
    }
}

impl From<&str> for FieldPath {
    /// Split a `/`-separated string into key segments. All-digit segments
    /// become index lookups.
    fn from(text: &str) -> Self {
        let mut path = FieldPath::root();
        for part in text.split('/').filter(|part| !part.is_empty()) {
            path = match part.parse::<usize>() {
                Ok(index) => path.at_index(index),
                Err(_) => path.at_field(part),
            };
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagson_test_utils::{sample_document, ObjectBuilder};

    #[test]
    fn test_extract_nested_values() {
        let document = sample_document();
        let name = FieldPath::field("name").extract(&document).unwrap();
        assert_eq!(name.as_str(), Some("Ada"));

        let tag = FieldPath::field("tags").at_index(1).extract(&document).unwrap();
        assert_eq!(tag.as_str(), Some("b"));

        let source = FieldPath::field("meta")
            .at_field("source")
            .extract(&document)
            .unwrap();
        assert_eq!(source.as_str(), Some("import"));
    }

    #[test]
    fn test_root_path_is_the_value_itself() {
        let document = sample_document();
        assert_eq!(FieldPath::root().extract(&document).unwrap(), &document);
    }

    #[test]
    fn test_missing_path_reports_failing_prefix() {
        let document = sample_document();
        let err = FieldPath::field("meta")
            .at_field("missing")
            .at_field("deeper")
            .extract(&document)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot find path meta/missing");

        let err = FieldPath::field("tags").at_index(9).extract(&document).unwrap_err();
        assert_eq!(err.to_string(), "Cannot find path tags/9");
    }

    #[test]
    fn test_typed_get_and_collect() {
        let document = sample_document();
        let age: i64 = FieldPath::field("age").get(&document).unwrap();
        assert_eq!(age, 36);

        let tags: Vec<String> = FieldPath::field("tags").collect(&document).unwrap();
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);

        let err = FieldPath::field("name").collect::<String>(&document).unwrap_err();
        assert_eq!(err.to_string(), "expected an array at path name");
    }

    #[test]
    fn test_parse_from_slash_string() {
        let path = FieldPath::from("data/tags/0");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("data".to_string()),
                Segment::Key("tags".to_string()),
                Segment::Index(0),
            ]
        );
        assert_eq!(path.to_string(), "data/tags/0");

        let document = ObjectBuilder::new()
            .value(
                "data",
                ObjectBuilder::new()
                    .value("tags", Value::Array(vec![Value::from("x")]))
                    .build(),
            )
            .build();
        assert_eq!(path.extract(&document).unwrap().as_str(), Some("x"));
    }
}
