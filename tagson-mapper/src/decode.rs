//! Decoder: `Value` trees to host types
//!
//! [`from_value`] drives any `DeserializeOwned` type over a deserializer that
//! reads out of an owned [`Value`]. Tagged variants are presented in their
//! sentinel-object form, so `from_value::<Value>` is the identity and the
//! wire leaf types (`Ref`, `Timestamp`, ...) decode from their own variants.
//!
//! `Null` into a mandatory target always fails with "Value is null";
//! `Option` targets see `None` instead. For struct targets, `Null`-valued
//! entries are dropped before field resolution, so members marked
//! `#[serde(default)]` fall back to their default rather than failing.

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer,
    MapAccess, SeqAccess, VariantAccess, Visitor,
};
use tagson_wire::sentinel::{is_sentinel_key, KEY_OBJ};
use tagson_wire::{DecodeError, Fields, Value};

/// Decode a `Value` tree into any `DeserializeOwned` host type.
pub fn from_value<T>(value: Value) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// `serde::Deserializer` reading out of an owned `Value`.
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    /// Wrap a value for decoding.
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }

    fn non_null(self) -> Result<Self, DecodeError> {
        if self.value.is_null() {
            Err(DecodeError::NullValue)
        } else {
            Ok(self)
        }
    }

    fn mismatch(&self, expected: &'static str) -> DecodeError {
        DecodeError::TypeMismatch {
            expected,
            found: self.value.type_name(),
        }
    }

    /// The object fields this value shows to generic map-shaped targets;
    /// tagged variants lower to their sentinel form first.
    fn into_fields(self, expected: &'static str) -> Result<Fields, DecodeError> {
        let mismatch = self.mismatch(expected);
        let lowered = self
            .value
            .into_sentinel_form()
            .map_err(|err| DecodeError::Message(err.to_string()))?;
        match lowered {
            Value::Object(fields) => Ok(fields),
            _ => Err(mismatch),
        }
    }
}

macro_rules! forward_mandatory {
    ($($method:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value, DecodeError>
            where
                V: Visitor<'de>,
            {
                self.non_null()?.deserialize_any(visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for ValueDeserializer {
    type Error = DecodeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::String(text) => visitor.visit_string(text),
            Value::Long(n) => visitor.visit_i64(n),
            Value::Double(d) => visitor.visit_f64(d),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Array(items) => visitor.visit_seq(SeqDecoder::new(items)),
            Value::Object(fields) => {
                // Untyped targets re-run sentinel dispatch, so a plain object
                // with colliding keys gets the same escape as on the wire.
                if fields.keys().any(|key| is_sentinel_key(key)) {
                    let mut escaped = Fields::new();
                    escaped.insert(KEY_OBJ.to_string(), Value::Object(fields));
                    visitor.visit_map(MapDecoder::new(escaped))
                } else {
                    visitor.visit_map(MapDecoder::new(fields))
                }
            }
            tagged => {
                let fields = ValueDeserializer::new(tagged).into_fields("a tagged value")?;
                visitor.visit_map(MapDecoder::new(fields))
            }
        }
    }

    forward_mandatory! {
        deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64
        deserialize_char deserialize_str deserialize_string
        deserialize_identifier
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(ValueDeserializer::new(value)),
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.mismatch("null")),
        }
    }

    fn deserialize_unit_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.non_null()?.value {
            Value::Bytes(bytes) => visitor.visit_byte_buf(bytes.into_vec()),
            Value::Array(items) => visitor.visit_seq(SeqDecoder::new(items)),
            other => Err(ValueDeserializer::new(other).mismatch("bytes")),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.non_null()?.value {
            Value::Array(items) => visitor.visit_seq(SeqDecoder::new(items)),
            Value::Bytes(bytes) => {
                let items = bytes
                    .into_vec()
                    .into_iter()
                    .map(|byte| Value::Long(i64::from(byte)))
                    .collect();
                visitor.visit_seq(SeqDecoder::new(items))
            }
            other => Err(ValueDeserializer::new(other).mismatch("array")),
        }
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        let fields = self.non_null()?.into_fields("object")?;
        visitor.visit_map(MapDecoder::new(fields))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        let mut fields = self.non_null()?.into_fields("object")?;
        // Defaults-over-failure: a null entry behaves like a missing one.
        fields.retain(|_, value| !value.is_null());
        visitor.visit_map(MapDecoder::new(fields))
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.non_null()?.value {
            Value::String(variant) => visitor.visit_enum(EnumDecoder {
                variant,
                value: None,
            }),
            Value::Object(mut fields) if fields.len() == 1 => {
                let Some((variant, value)) = fields.pop() else {
                    return Err(DecodeError::Message("empty enum object".into()));
                };
                visitor.visit_enum(EnumDecoder {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(ValueDeserializer::new(other).mismatch("enum string or object")),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct SeqDecoder {
    iter: std::vec::IntoIter<Value>,
    index: usize,
}

impl SeqDecoder {
    fn new(items: Vec<Value>) -> Self {
        SeqDecoder {
            iter: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDecoder {
    type Error = DecodeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, DecodeError>
    where
        T: DeserializeSeed<'de>,
    {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(ValueDeserializer::new(value))
            .map(Some)
            .map_err(|source| DecodeError::Index {
                index,
                source: Box::new(source),
            })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDecoder {
    iter: indexmap::map::IntoIter<String, Value>,
    pending: Option<(String, Value)>,
}

impl MapDecoder {
    fn new(fields: Fields) -> Self {
        MapDecoder {
            iter: fields.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapDecoder {
    type Error = DecodeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, DecodeError>
    where
        K: DeserializeSeed<'de>,
    {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        let decoded = seed.deserialize(key.clone().into_deserializer())?;
        self.pending = Some((key, value));
        Ok(Some(decoded))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, DecodeError>
    where
        V: DeserializeSeed<'de>,
    {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::Message("map value requested before its key".into()))?;
        seed.deserialize(ValueDeserializer::new(value))
            .map_err(|source| DecodeError::Field {
                field: key,
                source: Box::new(source),
            })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDecoder {
    variant: String,
    value: Option<Value>,
}

impl<'de> EnumAccess<'de> for EnumDecoder {
    type Error = DecodeError;
    type Variant = VariantDecoder;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantDecoder), DecodeError>
    where
        V: DeserializeSeed<'de>,
    {
        let decoded = seed.deserialize(self.variant.into_deserializer())?;
        Ok((decoded, VariantDecoder { value: self.value }))
    }
}

struct VariantDecoder {
    value: Option<Value>,
}

impl<'de> VariantAccess<'de> for VariantDecoder {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(DecodeError::Message(
                "unexpected value for unit enum variant".into(),
            )),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, DecodeError>
    where
        T: DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(DecodeError::Message(
                "missing value for newtype enum variant".into(),
            )),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(items)) => visitor.visit_seq(SeqDecoder::new(items)),
            Some(other) => Err(ValueDeserializer::new(other).mismatch("array")),
            None => Err(DecodeError::Message(
                "missing value for tuple enum variant".into(),
            )),
        }
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Value::Object(mut fields)) => {
                fields.retain(|_, value| !value.is_null());
                visitor.visit_map(MapDecoder::new(fields))
            }
            Some(other) => Err(ValueDeserializer::new(other).mismatch("object")),
            None => Err(DecodeError::Message(
                "missing value for struct enum variant".into(),
            )),
        }
    }
}
