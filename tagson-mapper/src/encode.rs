//! Encoder: host values to `Value` trees
//!
//! [`to_value`] drives any `Serialize` type through a serializer whose output
//! is a [`Value`]. Wire-typed inputs (a `Value`, a `Ref`, a `Timestamp`, ...)
//! pass through unchanged: the wire `Serialize` impls wrap their tagged forms
//! in named newtype structs, and the serializer recognizes those names and
//! re-interprets the sentinel shape instead of flattening it into a plain
//! object.

use serde::ser::{
    self, Impossible, Serialize, SerializeMap, SerializeSeq, SerializeStruct,
    SerializeStructVariant, SerializeTuple, SerializeTupleStruct, SerializeTupleVariant,
};
use tagson_wire::sentinel::{token, Sentinel, KEY_OBJ};
use tagson_wire::{Bytes, EncodeError, Fields, Value};

/// Nesting depth at which the encoder assumes a reference cycle.
///
/// `Serialize` exposes no object identity, so a true `Rc` cycle is
/// indistinguishable from an absurdly deep tree; both fail here.
pub const MAX_ENCODE_DEPTH: usize = 128;

/// Encode any `Serialize` host value into a wire `Value`.
///
/// Encoding an existing `Value` (or any tagged leaf type, at any nesting
/// level) is the identity.
pub fn to_value<T>(value: &T) -> Result<Value, EncodeError>
where
    T: Serialize + ?Sized,
{
    value.serialize(ValueSerializer { depth: 0 })
}

#[derive(Clone, Copy)]
struct ValueSerializer {
    depth: usize,
}

impl ValueSerializer {
    /// Depth for children of a container entered at this level.
    fn enter(&self, name: &str) -> Result<usize, EncodeError> {
        if self.depth >= MAX_ENCODE_DEPTH {
            Err(EncodeError::SelfReference(name.to_string()))
        } else {
            Ok(self.depth + 1)
        }
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = EncodeError;

    type SerializeSeq = SeqEncoder;
    type SerializeTuple = SeqEncoder;
    type SerializeTupleStruct = SeqEncoder;
    type SerializeTupleVariant = VariantSeqEncoder;
    type SerializeMap = MapEncoder;
    type SerializeStruct = StructEncoder;
    type SerializeStructVariant = VariantStructEncoder;

    fn serialize_bool(self, v: bool) -> Result<Value, EncodeError> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, EncodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, EncodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, EncodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, EncodeError> {
        Ok(Value::Long(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, EncodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, EncodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, EncodeError> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, EncodeError> {
        i64::try_from(v)
            .map(Value::Long)
            .map_err(|_| EncodeError::IntegerOutOfRange(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, EncodeError> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, EncodeError> {
        Ok(Value::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, EncodeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, EncodeError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, EncodeError> {
        Ok(Value::Bytes(Bytes::new(v)))
    }

    fn serialize_none(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, EncodeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, EncodeError> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        if is_wire_token(name) {
            let wire_form = value.serialize(ValueSerializer { depth: self.depth })?;
            reinterpret(name, wire_form)
        } else {
            value.serialize(self)
        }
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let mut fields = Fields::new();
        fields.insert(variant.to_string(), value.serialize(self)?);
        Ok(Value::Object(fields))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqEncoder, EncodeError> {
        let depth = self.enter("sequence")?;
        Ok(SeqEncoder {
            items: Vec::with_capacity(len.unwrap_or(0)),
            depth,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqEncoder, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqEncoder, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqEncoder, EncodeError> {
        let depth = self.enter(variant)?;
        Ok(VariantSeqEncoder {
            variant,
            items: Vec::with_capacity(len),
            depth,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapEncoder, EncodeError> {
        let depth = self.enter("map")?;
        Ok(MapEncoder {
            fields: Fields::new(),
            pending_key: None,
            depth,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<StructEncoder, EncodeError> {
        let depth = self.enter(name)?;
        Ok(StructEncoder {
            fields: Fields::new(),
            depth,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantStructEncoder, EncodeError> {
        let depth = self.enter(variant)?;
        Ok(VariantStructEncoder {
            variant,
            fields: Fields::new(),
            depth,
        })
    }
}

fn is_wire_token(name: &str) -> bool {
    matches!(
        name,
        token::OBJECT
            | token::REF
            | token::SET
            | token::TS
            | token::DATE
            | token::BYTES
            | token::QUERY
    )
}

/// Rebuild the tagged variant from the sentinel shape the wire impls emit.
fn reinterpret(name: &str, wire_form: Value) -> Result<Value, EncodeError> {
    if name == token::OBJECT {
        // The payload is the object body with the escape decision applied;
        // undo the `@obj` wrapper if one was added.
        return Ok(strip_obj_escape(wire_form));
    }
    let Value::Object(mut fields) = wire_form else {
        return Err(EncodeError::Message("malformed tagged wire form".into()));
    };
    let Some((key, body)) = fields.pop() else {
        return Err(EncodeError::Message("malformed tagged wire form".into()));
    };
    let Some(sentinel) = Sentinel::from_key(&key) else {
        return Err(EncodeError::Message("malformed tagged wire form".into()));
    };
    let body = match sentinel {
        Sentinel::Set | Sentinel::Query => strip_obj_escape(body),
        _ => body,
    };
    sentinel
        .apply(body)
        .map_err(|err| EncodeError::Message(err.to_string()))
}

fn strip_obj_escape(value: Value) -> Value {
    match value {
        Value::Object(mut fields)
            if fields.len() == 1 && matches!(fields.get(KEY_OBJ), Some(Value::Object(_))) =>
        {
            match fields.pop() {
                Some((_, inner)) => inner,
                None => Value::Object(fields),
            }
        }
        other => other,
    }
}

// A loop error already names the offending object; layering member context
// on top of it 128 times would bury the message.
fn wrap_field(source: EncodeError, field: &str) -> EncodeError {
    match source {
        err @ EncodeError::SelfReference(_) => err,
        source => EncodeError::Field {
            field: field.to_string(),
            source: Box::new(source),
        },
    }
}

fn wrap_index(source: EncodeError, index: usize) -> EncodeError {
    match source {
        err @ EncodeError::SelfReference(_) => err,
        source => EncodeError::Index {
            index,
            source: Box::new(source),
        },
    }
}

fn encode_member<T>(value: &T, depth: usize, field: &str) -> Result<Value, EncodeError>
where
    T: Serialize + ?Sized,
{
    value
        .serialize(ValueSerializer { depth })
        .map_err(|source| wrap_field(source, field))
}

struct SeqEncoder {
    items: Vec<Value>,
    depth: usize,
}

impl SerializeSeq for SeqEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let index = self.items.len();
        let encoded = value
            .serialize(ValueSerializer { depth: self.depth })
            .map_err(|source| wrap_index(source, index))?;
        self.items.push(encoded);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Array(self.items))
    }
}

impl SerializeTuple for SeqEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for SeqEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        SerializeSeq::end(self)
    }
}

struct VariantSeqEncoder {
    variant: &'static str,
    items: Vec<Value>,
    depth: usize,
}

impl SerializeTupleVariant for VariantSeqEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let index = self.items.len();
        let encoded = value
            .serialize(ValueSerializer { depth: self.depth })
            .map_err(|source| wrap_index(source, index))?;
        self.items.push(encoded);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        let mut fields = Fields::new();
        fields.insert(self.variant.to_string(), Value::Array(self.items));
        Ok(Value::Object(fields))
    }
}

struct MapEncoder {
    fields: Fields,
    pending_key: Option<String>,
    depth: usize,
}

impl SerializeMap for MapEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        self.pending_key = Some(key.serialize(MapKeySerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| EncodeError::Message("map value emitted before its key".into()))?;
        let encoded = encode_member(value, self.depth, &key)?;
        self.fields.insert(key, encoded);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Object(self.fields))
    }
}

struct StructEncoder {
    fields: Fields,
    depth: usize,
}

impl SerializeStruct for StructEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let encoded = encode_member(value, self.depth, key)?;
        self.fields.insert(key.to_string(), encoded);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Object(self.fields))
    }
}

struct VariantStructEncoder {
    variant: &'static str,
    fields: Fields,
    depth: usize,
}

impl SerializeStructVariant for VariantStructEncoder {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let encoded = encode_member(value, self.depth, key)?;
        self.fields.insert(key.to_string(), encoded);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        let mut fields = Fields::new();
        fields.insert(self.variant.to_string(), Value::Object(self.fields));
        Ok(Value::Object(fields))
    }
}

/// Map keys must encode to strings; everything else is rejected.
struct MapKeySerializer;

impl ser::Serializer for MapKeySerializer {
    type Ok = String;
    type Error = EncodeError;

    type SerializeSeq = Impossible<String, EncodeError>;
    type SerializeTuple = Impossible<String, EncodeError>;
    type SerializeTupleStruct = Impossible<String, EncodeError>;
    type SerializeTupleVariant = Impossible<String, EncodeError>;
    type SerializeMap = Impossible<String, EncodeError>;
    type SerializeStruct = Impossible<String, EncodeError>;
    type SerializeStructVariant = Impossible<String, EncodeError>;

    fn serialize_str(self, v: &str) -> Result<String, EncodeError> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String, EncodeError> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String, EncodeError> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_i8(self, _v: i8) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_i16(self, _v: i16) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_i32(self, _v: i32) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_i64(self, _v: i64) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_u8(self, _v: u8) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_u16(self, _v: u16) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_u32(self, _v: u32) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_u64(self, _v: u64) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_f32(self, _v: f32) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_f64(self, _v: f64) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_none(self) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_unit(self) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, EncodeError> {
        Err(EncodeError::NonStringKey)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, EncodeError> {
        Err(EncodeError::NonStringKey)
    }
}
