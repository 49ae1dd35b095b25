//! Tagson Mapper
//!
//! Bidirectional bridge between host types and [`tagson_wire::Value`] trees.
//! [`to_value`] runs any `Serialize` type through a `Value`-producing
//! serializer; [`from_value`] decodes a `Value` into any `DeserializeOwned`
//! type. [`FieldPath`] gives typed, path-based access into decoded documents.
//!
//! Both directions are lossless over `Value` itself: `to_value` and
//! `from_value` applied to a `Value` return it unchanged, tagged variants
//! included.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod encode;
pub mod field;

pub use decode::{from_value, ValueDeserializer};
pub use encode::{to_value, MAX_ENCODE_DEPTH};
pub use field::{FieldPath, Segment};
pub use tagson_wire::{DecodeError, EncodeError};
