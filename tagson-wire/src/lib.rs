//! Tagson wire format - tagged value model and JSON codec
//!
//! This crate provides the client-side data layer's core with no I/O
//! dependencies. It includes:
//!
//! - The closed tagged `Value` union for all wire data
//! - Document references and the native ref table
//! - High-precision timestamps, calendar dates, and byte payloads
//! - The reserved sentinel table (`@ref`, `@set`, `@ts`, `@date`, `@bytes`,
//!   `@query`, `@obj`)
//! - The wire codec: parsing and serialization with sentinel disambiguation
//!   and `@obj` escaping
//! - Error types
//!
//! Transport, retries, and the query-builder DSL live elsewhere; they hand
//! `Value` trees and raw bytes across this crate's boundary.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bytes;
pub mod error;
pub mod refs;
pub mod sentinel;
pub mod time;
pub mod value;

mod de;
mod ser;

// Re-export commonly used types
pub use bytes::Bytes;
pub use error::{CodecError, DecodeError, EncodeError, Result};
pub use refs::{Native, Ref};
pub use sentinel::Sentinel;
pub use time::{Date, Timestamp};
pub use value::{Fields, Query, SetRef, Value};

/// Parse wire bytes into a `Value` tree.
pub fn parse(bytes: &[u8]) -> Result<Value> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Parse wire text into a `Value` tree.
pub fn parse_str(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize a `Value` tree into wire bytes.
pub fn serialize(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Serialize a `Value` tree into wire text.
pub fn to_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
