//! Error types for the wire codec and the reflective mapper

use std::fmt;

use thiserror::Error;

/// Errors produced while parsing or emitting wire bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An `@ref` body was missing its `id` or carried a malformed sub-ref.
    #[error("malformed reference: {0}")]
    MalformedRef(String),
    /// An `@set` body was not an object of parameters.
    #[error("malformed set: expected an object of parameters")]
    MalformedSet,
    /// An `@query` body was not an object expression.
    #[error("malformed query: expected an object expression")]
    MalformedQuery,
    /// An `@obj` body was not an object.
    #[error("malformed escaped object: expected an object body")]
    MalformedObj,
    /// A sentinel body that must be a string literal was something else.
    #[error("expected a string literal for `{0}`")]
    ExpectedString(&'static str),
    /// An `@ts` literal was not a valid RFC 3339 instant.
    #[error("invalid timestamp literal `{0}`")]
    InvalidTimestamp(String),
    /// A timestamp cannot be rendered as an RFC 3339 instant.
    #[error("timestamp out of representable range")]
    TimestampRange,
    /// An `@date` literal was not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date literal `{0}`")]
    InvalidDate(String),
    /// An `@bytes` literal was not valid base64url text.
    #[error("invalid base64 literal `{0}`")]
    InvalidBytes(String),
    /// An integer token does not fit the `Long` range.
    #[error("integer out of range for Long: {0}")]
    IntegerOutOfRange(u64),
    /// Token-level JSON failure (unexpected token, truncated input, depth).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced while encoding host values into `Value` trees.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A map key did not encode to a string.
    #[error("Only string keys are supported for maps")]
    NonStringKey,
    /// The encode depth limit was hit, indicating a reference cycle.
    #[error("self reference loop detected for object `{0}`")]
    SelfReference(String),
    /// A `u64` beyond the `Long` range.
    #[error("integer out of range for Long: {0}")]
    IntegerOutOfRange(u64),
    /// Failure while encoding a named member; carries the member name.
    #[error("error encoding field `{field}`: {source}")]
    Field {
        /// Name of the struct field or map key that failed.
        field: String,
        /// The underlying failure.
        #[source]
        source: Box<EncodeError>,
    },
    /// Failure while encoding a sequence element; carries the index.
    #[error("error encoding element {index}: {source}")]
    Index {
        /// Zero-based position of the element that failed.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<EncodeError>,
    },
    /// Failure reported through `serde::ser::Error::custom`.
    #[error("{0}")]
    Message(String),
}

impl serde::ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        EncodeError::Message(msg.to_string())
    }
}

/// Errors produced while decoding `Value` trees into host values.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A `Null` reached a mandatory (non-optional) target.
    #[error("Value is null")]
    NullValue,
    /// The value's shape does not match the requested target.
    #[error("invalid type: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the target asked for.
        expected: &'static str,
        /// What the value actually was.
        found: &'static str,
    },
    /// Failure while decoding a named member; carries the member name.
    #[error("error decoding field `{field}`: {source}")]
    Field {
        /// Name of the struct field or map key that failed.
        field: String,
        /// The underlying failure.
        #[source]
        source: Box<DecodeError>,
    },
    /// Failure while decoding a sequence element; carries the index.
    #[error("error decoding element {index}: {source}")]
    Index {
        /// Zero-based position of the element that failed.
        index: usize,
        /// The underlying failure.
        #[source]
        source: Box<DecodeError>,
    },
    /// A path step found nothing at the described location.
    #[error("Cannot find path {0}")]
    PathMissing(String),
    /// A collect operation landed on something other than an array.
    #[error("expected an array at path {0}")]
    NotAnArray(String),
    /// Failure reported through `serde::de::Error::custom`.
    #[error("{0}")]
    Message(String),
}

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Message(msg.to_string())
    }
}

/// Result type alias for codec operations.
pub type Result<T, E = CodecError> = std::result::Result<T, E>;
