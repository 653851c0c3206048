use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, SchemaError};
use crate::types::AbstractType;

/// Structural role of a column within its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    PartitionKey,
    ClusteringKey,
    Regular,
    Static,
}

impl ColumnKind {
    /// Name used in persisted schema rows.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::PartitionKey => "partition_key",
            ColumnKind::ClusteringKey => "clustering_key",
            ColumnKind::Regular => "regular",
            ColumnKind::Static => "static",
        }
    }

    pub fn parse(value: &str) -> Result<Self, SchemaError> {
        match value.to_ascii_lowercase().as_str() {
            "partition_key" => Ok(ColumnKind::PartitionKey),
            "clustering_key" => Ok(ColumnKind::ClusteringKey),
            "regular" => Ok(ColumnKind::Regular),
            "static" => Ok(ColumnKind::Static),
            _ => Err(MarshalError::new(format!("unknown column kind '{value}'")).into()),
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of secondary index built on a column. Serialized under its persisted
/// name so RPC definitions and schema rows spell it the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    Keys,
    Composites,
    Custom,
}

impl IndexType {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexType::Keys => "KEYS",
            IndexType::Composites => "COMPOSITES",
            IndexType::Custom => "CUSTOM",
        }
    }

    pub fn parse(value: &str) -> Result<Self, SchemaError> {
        match value.to_ascii_uppercase().as_str() {
            "KEYS" => Ok(IndexType::Keys),
            "COMPOSITES" => Ok(IndexType::Composites),
            "CUSTOM" => Ok(IndexType::Custom),
            _ => Err(MarshalError::new(format!("unknown index type '{value}'")).into()),
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of a single column: name, value type, index and structural role.
///
/// Column definitions are immutable values; the `with_*` methods return modified
/// copies. Within one family a column is identified by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    name: Vec<u8>,
    validator: AbstractType,
    kind: ColumnKind,
    /// Position within a multi-component key or composite comparator.
    component_index: Option<u16>,
    index_name: Option<String>,
    index_type: Option<IndexType>,
    index_options: BTreeMap<String, String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<Vec<u8>>, validator: AbstractType, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            validator,
            kind,
            component_index: None,
            index_name: None,
            index_type: None,
            index_options: BTreeMap::new(),
        }
    }

    pub fn regular(name: impl Into<Vec<u8>>, validator: AbstractType) -> Self {
        Self::new(name, validator, ColumnKind::Regular)
    }

    pub fn partition_key(
        name: impl Into<Vec<u8>>,
        validator: AbstractType,
        component_index: Option<u16>,
    ) -> Self {
        Self {
            component_index,
            ..Self::new(name, validator, ColumnKind::PartitionKey)
        }
    }

    pub fn clustering_key(
        name: impl Into<Vec<u8>>,
        validator: AbstractType,
        component_index: Option<u16>,
    ) -> Self {
        Self {
            component_index,
            ..Self::new(name, validator, ColumnKind::ClusteringKey)
        }
    }

    pub fn static_column(name: impl Into<Vec<u8>>, validator: AbstractType) -> Self {
        Self::new(name, validator, ColumnKind::Static)
    }

    #[must_use]
    pub fn with_index(
        mut self,
        index_name: impl Into<String>,
        index_type: IndexType,
        index_options: BTreeMap<String, String>,
    ) -> Self {
        self.index_name = Some(index_name.into());
        self.index_type = Some(index_type);
        self.index_options = index_options;
        self
    }

    #[must_use]
    pub fn without_index(mut self) -> Self {
        self.index_name = None;
        self.index_type = None;
        self.index_options.clear();
        self
    }

    #[must_use]
    pub fn with_component_index(mut self, component_index: Option<u16>) -> Self {
        self.component_index = component_index;
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: AbstractType) -> Self {
        self.validator = validator;
        self
    }

    pub(crate) fn set_index_parts(
        &mut self,
        index_name: Option<String>,
        index_type: Option<IndexType>,
        index_options: BTreeMap<String, String>,
    ) {
        self.index_name = index_name;
        self.index_type = index_type;
        self.index_options = index_options;
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// The name as text, with invalid UTF-8 replaced; for messages and display.
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    pub fn validator(&self) -> AbstractType {
        self.validator
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn component_index(&self) -> Option<u16> {
        self.component_index
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn index_type(&self) -> Option<IndexType> {
        self.index_type
    }

    pub fn index_options(&self) -> &BTreeMap<String, String> {
        &self.index_options
    }

    pub fn is_indexed(&self) -> bool {
        self.index_type.is_some()
    }

    pub fn is_part_of_primary_key(&self) -> bool {
        matches!(self.kind, ColumnKind::PartitionKey | ColumnKind::ClusteringKey)
    }

    /// Whether an RPC definition can express this column: a regular column with
    /// no component position.
    pub fn is_rpc_compatible(&self) -> bool {
        self.kind == ColumnKind::Regular && self.component_index.is_none()
    }

    /// Orders two columns by name under the family's comparator.
    pub fn compare_names(&self, other: &ColumnDefinition, comparator: AbstractType) -> Ordering {
        comparator.compare(&self.name, &other.name)
    }
}
