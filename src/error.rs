use std::fmt;

/// A payload or literal that does not belong to a type's encoding space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarshalError {
    message: String,
}

impl MarshalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for MarshalError {}

/// Errors raised while building, converting or validating schema metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A type name has no registered value type.
    UnknownType(String),
    /// Bytes or text outside the encoding space of a type.
    MalformedValue(MarshalError),
    /// Two persisted column rows claim the same column name.
    DuplicateColumn {
        keyspace: String,
        table: String,
        column: String,
    },
    /// A persisted row lacks a cell the conversion requires.
    MissingField { table: String, field: String },
    /// Metadata that is well-formed but violates a schema rule.
    InvalidConfiguration(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownType(name) => write!(f, "unknown type '{name}'"),
            SchemaError::MalformedValue(e) => write!(f, "malformed value: {e}"),
            SchemaError::DuplicateColumn {
                keyspace,
                table,
                column,
            } => write!(
                f,
                "duplicate definition of column '{column}' in {keyspace}.{table}"
            ),
            SchemaError::MissingField { table, field } => {
                write!(f, "row of '{table}' is missing field '{field}'")
            }
            SchemaError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::MalformedValue(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MarshalError> for SchemaError {
    fn from(err: MarshalError) -> Self {
        SchemaError::MalformedValue(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_marshal_error_converts_to_malformed_value() {
        let err: SchemaError = MarshalError::new("Invalid byte for ascii: -1").into();
        assert!(matches!(err, SchemaError::MalformedValue(_)));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("ascii"));
    }

    #[test]
    fn test_duplicate_column_display() {
        let err = SchemaError::DuplicateColumn {
            keyspace: "Keyspace1".to_string(),
            table: "Standard1".to_string(),
            column: "col1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Keyspace1.Standard1"));
        assert!(msg.contains("col1"));
        assert!(err.source().is_none());
    }
}
