//! Value types: comparators, serializers and literal parsers for every storable value kind.
//!
//! A value type is a closed set of variants ([`AbstractType`]) dispatched through
//! four capabilities:
//!
//! - **compare** raw payloads without decoding them, so the storage engine can use
//!   it directly as a sort comparator
//! - **compose / decompose** between payloads and [`CellValue`]s
//! - **from_string** for literal ingestion
//! - **as_cql3_type** for the type name reported to query-language clients
//!
//! Types are referenced externally by name; [`TypeRegistry`] resolves those names,
//! so new bindings can be added without touching dispatch.
//!
//! # Example
//!
//! ```rust
//! use manifold_schema::{AbstractType, TypeRegistry};
//! use std::cmp::Ordering;
//!
//! let ascii = TypeRegistry::global()
//!     .resolve("org.apache.cassandra.db.marshal.AsciiType")
//!     .unwrap();
//! assert_eq!(ascii, AbstractType::Ascii);
//! assert_eq!(ascii.compare(b"ab", b"b"), Ordering::Less);
//! ```

pub(crate) mod registry;
pub(crate) mod serializers;
pub(crate) mod value;

use std::cmp::Ordering;
use std::fmt;

use chrono_v0_4::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::MarshalError;

pub use registry::TypeRegistry;
pub use serializers::{
    AsciiSerializer, BooleanSerializer, BytesSerializer, DoubleSerializer, Int32Serializer,
    LongSerializer, TimestampSerializer, TypeSerializer, Utf8Serializer, UuidSerializer,
};
pub use value::CellValue;

/// Package prefix of canonical type class names.
pub const MARSHAL_PACKAGE: &str = "org.apache.cassandra.db.marshal.";

/// Logical type tag reported to query-language clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cql3Type {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Double,
    Int,
    Text,
    Timestamp,
    Uuid,
}

impl Cql3Type {
    pub fn name(self) -> &'static str {
        match self {
            Cql3Type::Ascii => "ascii",
            Cql3Type::Bigint => "bigint",
            Cql3Type::Blob => "blob",
            Cql3Type::Boolean => "boolean",
            Cql3Type::Double => "double",
            Cql3Type::Int => "int",
            Cql3Type::Text => "text",
            Cql3Type::Timestamp => "timestamp",
            Cql3Type::Uuid => "uuid",
        }
    }
}

impl fmt::Display for Cql3Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value type. Variants hold no state, so a copy is as good as the original
/// and every instance is safe to share between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbstractType {
    /// Arbitrary bytes, ordered byte-wise.
    Bytes,
    /// 7-bit ASCII text, ordered byte-wise.
    Ascii,
    /// UTF-8 text, ordered byte-wise (which matches code point order).
    Utf8,
    Int32,
    Long,
    Boolean,
    Double,
    /// Version-aware UUID ordering; version 1 UUIDs order by timestamp.
    Uuid,
    /// Milliseconds since the epoch.
    Timestamp,
}

impl AbstractType {
    /// Every built-in type.
    pub const ALL: [AbstractType; 9] = [
        AbstractType::Bytes,
        AbstractType::Ascii,
        AbstractType::Utf8,
        AbstractType::Int32,
        AbstractType::Long,
        AbstractType::Boolean,
        AbstractType::Double,
        AbstractType::Uuid,
        AbstractType::Timestamp,
    ];

    /// Unqualified class name, e.g. `AsciiType`.
    pub fn short_name(self) -> &'static str {
        match self {
            AbstractType::Bytes => "BytesType",
            AbstractType::Ascii => "AsciiType",
            AbstractType::Utf8 => "UTF8Type",
            AbstractType::Int32 => "Int32Type",
            AbstractType::Long => "LongType",
            AbstractType::Boolean => "BooleanType",
            AbstractType::Double => "DoubleType",
            AbstractType::Uuid => "UUIDType",
            AbstractType::Timestamp => "TimestampType",
        }
    }

    /// Canonical name used in RPC definitions and persisted schema rows.
    pub fn class_name(self) -> String {
        format!("{MARSHAL_PACKAGE}{}", self.short_name())
    }

    pub fn as_cql3_type(self) -> Cql3Type {
        match self {
            AbstractType::Bytes => Cql3Type::Blob,
            AbstractType::Ascii => Cql3Type::Ascii,
            AbstractType::Utf8 => Cql3Type::Text,
            AbstractType::Int32 => Cql3Type::Int,
            AbstractType::Long => Cql3Type::Bigint,
            AbstractType::Boolean => Cql3Type::Boolean,
            AbstractType::Double => Cql3Type::Double,
            AbstractType::Uuid => Cql3Type::Uuid,
            AbstractType::Timestamp => Cql3Type::Timestamp,
        }
    }

    /// Width of every non-empty payload, or `None` for variable-width types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            AbstractType::Bytes | AbstractType::Ascii | AbstractType::Utf8 => None,
            AbstractType::Int32 => Some(4),
            AbstractType::Long | AbstractType::Double | AbstractType::Timestamp => Some(8),
            AbstractType::Boolean => Some(1),
            AbstractType::Uuid => Some(16),
        }
    }

    /// Total order over encoded payloads. Never decodes text and never fails.
    /// Doubles and UUIDs of the wrong width sort after every valid payload and
    /// among themselves byte-wise.
    pub fn compare(self, left: &[u8], right: &[u8]) -> Ordering {
        if left.is_empty() || right.is_empty() {
            return left.len().min(1).cmp(&right.len().min(1));
        }
        match self {
            AbstractType::Bytes
            | AbstractType::Ascii
            | AbstractType::Utf8
            | AbstractType::Boolean => left.cmp(right),
            AbstractType::Int32 | AbstractType::Long | AbstractType::Timestamp => {
                compare_signed(left, right)
            }
            AbstractType::Double => match (
                DoubleSerializer.deserialize(left),
                DoubleSerializer.deserialize(right),
            ) {
                (Ok(l), Ok(r)) => l.total_cmp(&r),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => left.cmp(right),
            },
            AbstractType::Uuid => compare_uuids(left, right),
        }
    }

    /// Checks that `bytes` is a valid payload for this type.
    pub fn validate(self, bytes: &[u8]) -> Result<(), MarshalError> {
        if bytes.is_empty() {
            return Ok(());
        }
        match self {
            AbstractType::Bytes => BytesSerializer.validate(bytes),
            AbstractType::Ascii => AsciiSerializer.validate(bytes),
            AbstractType::Utf8 => Utf8Serializer.validate(bytes),
            AbstractType::Int32 => Int32Serializer.validate(bytes),
            AbstractType::Long => LongSerializer.validate(bytes),
            AbstractType::Boolean => BooleanSerializer.validate(bytes),
            AbstractType::Double => DoubleSerializer.validate(bytes),
            AbstractType::Uuid => UuidSerializer.validate(bytes),
            AbstractType::Timestamp => TimestampSerializer.validate(bytes),
        }
    }

    /// Decodes a payload.
    ///
    /// A zero-length payload decodes to the empty value of variable-width types
    /// (`""` or no bytes) and to [`CellValue::Empty`] for fixed-width ones.
    pub fn compose(self, bytes: &[u8]) -> Result<CellValue, MarshalError> {
        if bytes.is_empty() && self.fixed_width().is_some() {
            return Ok(CellValue::Empty);
        }
        Ok(match self {
            AbstractType::Bytes => CellValue::Bytes(BytesSerializer.deserialize(bytes)?),
            AbstractType::Ascii => CellValue::Text(AsciiSerializer.deserialize(bytes)?),
            AbstractType::Utf8 => CellValue::Text(Utf8Serializer.deserialize(bytes)?),
            AbstractType::Int32 => CellValue::Int32(Int32Serializer.deserialize(bytes)?),
            AbstractType::Long => CellValue::Long(LongSerializer.deserialize(bytes)?),
            AbstractType::Boolean => CellValue::Boolean(BooleanSerializer.deserialize(bytes)?),
            AbstractType::Double => CellValue::Double(DoubleSerializer.deserialize(bytes)?),
            AbstractType::Uuid => CellValue::Uuid(UuidSerializer.deserialize(bytes)?),
            AbstractType::Timestamp => {
                CellValue::Timestamp(TimestampSerializer.deserialize(bytes)?)
            }
        })
    }

    /// Encodes a value. Fails when the value's variant does not belong to this
    /// type, or (for ASCII) when the text is not 7-bit clean.
    pub fn decompose(self, value: &CellValue) -> Result<Vec<u8>, MarshalError> {
        match (self, value) {
            (_, CellValue::Empty) => Ok(Vec::new()),
            (AbstractType::Bytes, CellValue::Bytes(v)) => Ok(BytesSerializer.serialize(v)),
            (AbstractType::Ascii, CellValue::Text(v)) => {
                let bytes = AsciiSerializer.serialize(v);
                AsciiSerializer.validate(&bytes)?;
                Ok(bytes)
            }
            (AbstractType::Utf8, CellValue::Text(v)) => Ok(Utf8Serializer.serialize(v)),
            (AbstractType::Int32, CellValue::Int32(v)) => Ok(Int32Serializer.serialize(v)),
            (AbstractType::Long, CellValue::Long(v)) => Ok(LongSerializer.serialize(v)),
            (AbstractType::Boolean, CellValue::Boolean(v)) => Ok(BooleanSerializer.serialize(v)),
            (AbstractType::Double, CellValue::Double(v)) => Ok(DoubleSerializer.serialize(v)),
            (AbstractType::Uuid, CellValue::Uuid(v)) => Ok(UuidSerializer.serialize(v)),
            (AbstractType::Timestamp, CellValue::Timestamp(v)) => {
                Ok(TimestampSerializer.serialize(v))
            }
            (ty, value) => Err(MarshalError::new(format!(
                "cannot encode a {} value as {}",
                value.kind(),
                ty.short_name()
            ))),
        }
    }

    /// Parses a human-readable literal into this type's payload.
    pub fn from_string(self, source: &str) -> Result<Vec<u8>, MarshalError> {
        if source.is_empty() && self.fixed_width().is_some() {
            return Ok(Vec::new());
        }
        match self {
            AbstractType::Bytes => hex::decode(source)
                .map_err(|e| MarshalError::new(format!("cannot parse '{source}' as hex bytes: {e}"))),
            AbstractType::Ascii => self.decompose(&CellValue::Text(source.to_string())),
            AbstractType::Utf8 => Ok(source.as_bytes().to_vec()),
            AbstractType::Int32 => source
                .parse::<i32>()
                .map(|v| Int32Serializer.serialize(&v))
                .map_err(|e| MarshalError::new(format!("unable to make int from '{source}': {e}"))),
            AbstractType::Long => source
                .parse::<i64>()
                .map(|v| LongSerializer.serialize(&v))
                .map_err(|e| {
                    MarshalError::new(format!("unable to make long from '{source}': {e}"))
                }),
            AbstractType::Boolean => match source.to_ascii_lowercase().as_str() {
                "true" => Ok(BooleanSerializer.serialize(&true)),
                "false" => Ok(BooleanSerializer.serialize(&false)),
                _ => Err(MarshalError::new(format!(
                    "unable to make boolean from '{source}'"
                ))),
            },
            AbstractType::Double => source
                .parse::<f64>()
                .map(|v| DoubleSerializer.serialize(&v))
                .map_err(|e| {
                    MarshalError::new(format!("unable to make double from '{source}': {e}"))
                }),
            AbstractType::Uuid => uuid::Uuid::parse_str(source)
                .map(|v| UuidSerializer.serialize(&v))
                .map_err(|e| MarshalError::new(format!("unable to make UUID from '{source}': {e}"))),
            AbstractType::Timestamp => {
                parse_timestamp(source).map(|millis| TimestampSerializer.serialize(&millis))
            }
        }
    }

    /// Renders a payload as text; the inverse of [`from_string`](Self::from_string)
    /// for every value that literal parsing can produce.
    pub fn get_string(self, bytes: &[u8]) -> Result<String, MarshalError> {
        Ok(match self.compose(bytes)? {
            CellValue::Empty => String::new(),
            CellValue::Bytes(v) => BytesSerializer.to_display_string(&v),
            CellValue::Text(v) => v,
            CellValue::Int32(v) => Int32Serializer.to_display_string(&v),
            CellValue::Long(v) => LongSerializer.to_display_string(&v),
            CellValue::Boolean(v) => BooleanSerializer.to_display_string(&v),
            CellValue::Double(v) => DoubleSerializer.to_display_string(&v),
            CellValue::Uuid(v) => UuidSerializer.to_display_string(&v),
            CellValue::Timestamp(v) => TimestampSerializer.to_display_string(&v),
        })
    }

    /// Whether data sorted by `previous` stays sorted under `self`, so a
    /// comparator can be changed from `previous` to `self`.
    pub fn is_compatible_with(self, previous: AbstractType) -> bool {
        self == previous
            || matches!(
                (self, previous),
                (AbstractType::Utf8, AbstractType::Ascii)
                    | (AbstractType::Bytes, AbstractType::Ascii | AbstractType::Utf8)
            )
    }

    /// Whether every payload valid for `previous` is valid for `self`.
    pub fn is_value_compatible_with(self, previous: AbstractType) -> bool {
        self == AbstractType::Bytes || self.is_compatible_with(previous)
    }
}

impl fmt::Display for AbstractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MARSHAL_PACKAGE}{}", self.short_name())
    }
}

/// Orders big-endian two's complement integers: the first byte is signed, the
/// rest unsigned.
fn compare_signed(left: &[u8], right: &[u8]) -> Ordering {
    (left[0] as i8)
        .cmp(&(right[0] as i8))
        .then_with(|| left[1..].cmp(&right[1..]))
}

fn compare_uuids(left: &[u8], right: &[u8]) -> Ordering {
    match (left.len() == 16, right.len() == 16) {
        (true, true) => {}
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => return left.cmp(right),
    }
    let version = |b: &[u8]| (b[6] >> 4) & 0x0f;
    version(left).cmp(&version(right)).then_with(|| {
        if version(left) == 1 {
            uuid_timestamp(left)
                .cmp(&uuid_timestamp(right))
                .then_with(|| left.cmp(right))
        } else {
            left.cmp(right)
        }
    })
}

/// Reassembles the 60-bit timestamp of a version 1 UUID (`time_hi`, `time_mid`, `time_low`).
fn uuid_timestamp(b: &[u8]) -> u64 {
    (u64::from(b[6] & 0x0f) << 56)
        | (u64::from(b[7]) << 48)
        | (u64::from(b[4]) << 40)
        | (u64::from(b[5]) << 32)
        | (u64::from(b[0]) << 24)
        | (u64::from(b[1]) << 16)
        | (u64::from(b[2]) << 8)
        | u64::from(b[3])
}

/// Accepts raw milliseconds or an ISO-8601 date; zone-less dates are UTC.
fn parse_timestamp(source: &str) -> Result<i64, MarshalError> {
    if let Ok(millis) = source.parse::<i64>() {
        return Ok(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(source) {
        return Ok(dt.timestamp_millis());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%d %H:%M%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(source, pattern) {
            return Ok(dt.timestamp_millis());
        }
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(source, pattern) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(source, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    Err(MarshalError::new(format!(
        "unable to coerce '{source}' to a formatted date (long)"
    )))
}
