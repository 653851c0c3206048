//! Per-type payload serializers.
//!
//! Each serializer is a stateless unit struct; the struct value itself is the
//! process-wide instance, so sharing one across threads needs no
//! synchronization. Serializers see only non-empty payloads for fixed-width
//! types: the zero-length "no value" payload is handled by
//! [`AbstractType`](super::AbstractType) before dispatch.

use chrono_v0_4::{DateTime, SecondsFormat};
use uuid::Uuid;

use crate::error::MarshalError;

/// Validates, encodes and decodes the byte payloads of one value type.
pub trait TypeSerializer: Send + Sync {
    /// The decoded representation.
    type Value;

    /// Encodes a value into its canonical byte form.
    fn serialize(&self, value: &Self::Value) -> Vec<u8>;

    /// Decodes a payload, failing when it is outside the encoding space.
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Value, MarshalError>;

    /// Checks a payload without keeping the decoded value.
    fn validate(&self, bytes: &[u8]) -> Result<(), MarshalError> {
        self.deserialize(bytes).map(|_| ())
    }

    /// Renders a value the way it is reported to users.
    fn to_display_string(&self, value: &Self::Value) -> String;
}

fn fixed_width<const N: usize>(bytes: &[u8], type_name: &str) -> Result<[u8; N], MarshalError> {
    bytes.try_into().map_err(|_| {
        MarshalError::new(format!(
            "Expected {N} or 0 byte {type_name} ({})",
            bytes.len()
        ))
    })
}

/// Arbitrary bytes; every payload is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesSerializer;

impl TypeSerializer for BytesSerializer {
    type Value = Vec<u8>;

    fn serialize(&self, value: &Vec<u8>) -> Vec<u8> {
        value.clone()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Vec<u8>, MarshalError> {
        Ok(bytes.to_vec())
    }

    fn validate(&self, _bytes: &[u8]) -> Result<(), MarshalError> {
        Ok(())
    }

    fn to_display_string(&self, value: &Vec<u8>) -> String {
        hex::encode(value)
    }
}

/// US-ASCII text: every byte must be in `0x00..=0x7F`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiSerializer;

impl TypeSerializer for AsciiSerializer {
    type Value = String;

    fn serialize(&self, value: &String) -> Vec<u8> {
        value.as_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, MarshalError> {
        self.validate(bytes)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| MarshalError::new(format!("Invalid ascii bytes: {e}")))
    }

    fn validate(&self, bytes: &[u8]) -> Result<(), MarshalError> {
        match bytes.iter().find(|b| !b.is_ascii()) {
            Some(b) => Err(MarshalError::new(format!(
                "Invalid byte for ascii: {}",
                *b as i8
            ))),
            None => Ok(()),
        }
    }

    fn to_display_string(&self, value: &String) -> String {
        value.clone()
    }
}

/// UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Serializer;

impl TypeSerializer for Utf8Serializer {
    type Value = String;

    fn serialize(&self, value: &String) -> Vec<u8> {
        value.as_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<String, MarshalError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| MarshalError::new(format!("String didn't validate: {e}")))
    }

    fn to_display_string(&self, value: &String) -> String {
        value.clone()
    }
}

/// 32-bit signed integer, big-endian two's complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int32Serializer;

impl TypeSerializer for Int32Serializer {
    type Value = i32;

    fn serialize(&self, value: &i32) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<i32, MarshalError> {
        Ok(i32::from_be_bytes(fixed_width(bytes, "int")?))
    }

    fn to_display_string(&self, value: &i32) -> String {
        value.to_string()
    }
}

/// 64-bit signed integer, big-endian two's complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongSerializer;

impl TypeSerializer for LongSerializer {
    type Value = i64;

    fn serialize(&self, value: &i64) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<i64, MarshalError> {
        Ok(i64::from_be_bytes(fixed_width(bytes, "long")?))
    }

    fn to_display_string(&self, value: &i64) -> String {
        value.to_string()
    }
}

/// Single byte, `0` for `false` and `1` for `true`. Other bytes are rejected,
/// so byte-wise order agrees with `false < true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanSerializer;

impl TypeSerializer for BooleanSerializer {
    type Value = bool;

    fn serialize(&self, value: &bool) -> Vec<u8> {
        vec![u8::from(*value)]
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<bool, MarshalError> {
        match fixed_width::<1>(bytes, "boolean")? {
            [0] => Ok(false),
            [1] => Ok(true),
            [b] => Err(MarshalError::new(format!("Invalid boolean byte: {b}"))),
        }
    }

    fn to_display_string(&self, value: &bool) -> String {
        value.to_string()
    }
}

/// IEEE-754 double, big-endian.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSerializer;

impl TypeSerializer for DoubleSerializer {
    type Value = f64;

    fn serialize(&self, value: &f64) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<f64, MarshalError> {
        Ok(f64::from_be_bytes(fixed_width(bytes, "double")?))
    }

    fn to_display_string(&self, value: &f64) -> String {
        value.to_string()
    }
}

/// 16-byte UUID in RFC 4122 byte order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSerializer;

impl TypeSerializer for UuidSerializer {
    type Value = Uuid;

    fn serialize(&self, value: &Uuid) -> Vec<u8> {
        value.as_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Uuid, MarshalError> {
        Ok(Uuid::from_bytes(fixed_width(bytes, "UUID")?))
    }

    fn to_display_string(&self, value: &Uuid) -> String {
        value.hyphenated().to_string()
    }
}

/// Milliseconds since the Unix epoch as a big-endian signed long.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampSerializer;

impl TypeSerializer for TimestampSerializer {
    type Value = i64;

    fn serialize(&self, value: &i64) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<i64, MarshalError> {
        Ok(i64::from_be_bytes(fixed_width(bytes, "timestamp")?))
    }

    fn to_display_string(&self, value: &i64) -> String {
        match DateTime::from_timestamp_millis(*value) {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => value.to_string(),
        }
    }
}
