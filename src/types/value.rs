//! Decoded form of a typed cell payload.

use uuid::Uuid;

/// A value decoded from (or about to be encoded into) a type's byte form.
///
/// `Empty` is the decoded form of a zero-length payload of a fixed-width type.
/// Every type accepts that payload and sorts it before any other value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    Int32(i32),
    Long(i64),
    Boolean(bool),
    Double(f64),
    Uuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
}

impl CellValue {
    /// Returns the variant name, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Bytes(_) => "Bytes",
            Self::Text(_) => "Text",
            Self::Int32(_) => "Int32",
            Self::Long(_) => "Long",
            Self::Boolean(_) => "Boolean",
            Self::Double(_) => "Double",
            Self::Uuid(_) => "Uuid",
            Self::Timestamp(_) => "Timestamp",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(value) | Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<Uuid> for CellValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}
