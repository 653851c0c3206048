//! Conversion between [`CfMetaData`] and RPC (Thrift-style) column family definitions.
//!
//! The RPC shapes are plain data-transfer objects. They implement serde's
//! traits and the transport picks the encoding. Type names travel as canonical class names and are
//! resolved through a [`TypeRegistry`].
//!
//! RPC definitions can only describe regular columns without a component
//! position. [`CfMetaData::to_rpc`] leaves every other column out: that
//! projection is the defined behaviour, not an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchemaError;
use crate::schema::{
    CfMetaData, ColumnDefinition, ColumnFamilyType, CompressionParameters,
    DEFAULT_MAX_COMPACTION_THRESHOLD, DEFAULT_MIN_COMPACTION_THRESHOLD, IndexType,
};
use crate::types::TypeRegistry;

/// RPC description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcColumnDef {
    pub name: Vec<u8>,
    pub validation_class: String,
    pub index_type: Option<IndexType>,
    pub index_name: Option<String>,
    pub index_options: Option<BTreeMap<String, String>>,
}

impl RpcColumnDef {
    pub fn new(name: impl Into<Vec<u8>>, validation_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validation_class: validation_class.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    #[must_use]
    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = Some(index_type);
        self
    }

    #[must_use]
    pub fn with_index_options(mut self, index_options: BTreeMap<String, String>) -> Self {
        self.index_options = Some(index_options);
        self
    }
}

/// RPC description of a column family. Unset optional fields take the
/// defaults of [`CfMetaData::builder`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcDefinition {
    pub keyspace: String,
    pub name: String,
    pub id: Option<Uuid>,
    pub column_type: Option<String>,
    pub comparator_type: Option<String>,
    pub key_validation_class: Option<String>,
    pub default_validation_class: Option<String>,
    pub comment: Option<String>,
    pub column_metadata: Vec<RpcColumnDef>,
    pub compression_options: Option<BTreeMap<String, String>>,
    pub gc_grace_seconds: Option<i32>,
    pub default_time_to_live: Option<i32>,
    pub read_repair_chance: Option<f64>,
    pub min_compaction_threshold: Option<i32>,
    pub max_compaction_threshold: Option<i32>,
    pub generation: Option<i64>,
}

impl RpcDefinition {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

impl ColumnDefinition {
    /// Builds a regular column from its RPC description.
    pub fn from_rpc(def: &RpcColumnDef, registry: &TypeRegistry) -> Result<Self, SchemaError> {
        let validator = registry.resolve(&def.validation_class)?;
        let mut column = ColumnDefinition::regular(def.name.clone(), validator);
        column.set_index_parts(
            def.index_name.clone(),
            def.index_type,
            def.index_options.clone().unwrap_or_default(),
        );
        Ok(column)
    }

    /// The RPC description of this column. Meaningful only for columns where
    /// [`is_rpc_compatible`](Self::is_rpc_compatible) holds.
    pub fn to_rpc(&self) -> RpcColumnDef {
        RpcColumnDef {
            name: self.name().to_vec(),
            validation_class: self.validator().class_name(),
            index_type: self.index_type(),
            index_name: self.index_name().map(str::to_string),
            index_options: (!self.index_options().is_empty())
                .then(|| self.index_options().clone()),
        }
    }
}

impl CfMetaData {
    /// Converts an RPC definition, resolving every type name through `registry`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] if a type name is not registered
    /// - [`SchemaError::DuplicateColumn`] if two column entries share a name
    /// - [`SchemaError::InvalidConfiguration`] for an unknown column type or
    ///   unusable compression options
    pub fn from_rpc(def: &RpcDefinition, registry: &TypeRegistry) -> Result<Self, SchemaError> {
        let mut builder = CfMetaData::builder(def.keyspace.clone(), def.name.clone());

        if let Some(id) = def.id {
            builder = builder.id(id);
        }
        if let Some(column_type) = &def.column_type {
            builder = builder.cf_type(ColumnFamilyType::parse(column_type)?);
        }
        if let Some(comparator) = &def.comparator_type {
            builder = builder.comparator(registry.resolve(comparator)?);
        }
        if let Some(key_validator) = &def.key_validation_class {
            builder = builder.key_validator(registry.resolve(key_validator)?);
        }
        if let Some(default_validator) = &def.default_validation_class {
            builder = builder.default_validator(registry.resolve(default_validator)?);
        }
        if let Some(comment) = &def.comment {
            builder = builder.comment(comment.clone());
        }
        if let Some(options) = &def.compression_options {
            builder = builder.compression(CompressionParameters::from_rpc_options(options)?);
        }
        if let Some(seconds) = def.gc_grace_seconds {
            builder = builder.gc_grace_seconds(seconds);
        }
        if let Some(ttl) = def.default_time_to_live {
            builder = builder.default_time_to_live(ttl);
        }
        if let Some(chance) = def.read_repair_chance {
            builder = builder.read_repair_chance(chance);
        }
        if def.min_compaction_threshold.is_some() || def.max_compaction_threshold.is_some() {
            builder = builder.compaction_thresholds(
                def.min_compaction_threshold
                    .unwrap_or(DEFAULT_MIN_COMPACTION_THRESHOLD),
                def.max_compaction_threshold
                    .unwrap_or(DEFAULT_MAX_COMPACTION_THRESHOLD),
            );
        }
        if let Some(generation) = def.generation {
            builder = builder.generation(generation);
        }

        let columns = def
            .column_metadata
            .iter()
            .map(|column| ColumnDefinition::from_rpc(column, registry))
            .collect::<Result<Vec<_>, _>>()?;

        builder.columns(columns).build()
    }

    /// Projects this metadata onto an RPC definition, leaving out columns an
    /// RPC definition cannot express.
    pub fn to_rpc(&self) -> RpcDefinition {
        RpcDefinition {
            keyspace: self.ks_name().to_string(),
            name: self.cf_name().to_string(),
            id: Some(self.cf_id()),
            column_type: Some(self.cf_type().as_str().to_string()),
            comparator_type: Some(self.comparator().class_name()),
            key_validation_class: Some(self.key_validator().class_name()),
            default_validation_class: Some(self.default_validator().class_name()),
            comment: Some(self.comment().to_string()),
            column_metadata: self
                .columns()
                .filter(|column| column.is_rpc_compatible())
                .map(ColumnDefinition::to_rpc)
                .collect(),
            compression_options: Some(self.compression().as_rpc_options()),
            gc_grace_seconds: Some(self.gc_grace_seconds()),
            default_time_to_live: Some(self.default_time_to_live()),
            read_repair_chance: Some(self.read_repair_chance()),
            min_compaction_threshold: Some(self.min_compaction_threshold()),
            max_compaction_threshold: Some(self.max_compaction_threshold()),
            generation: Some(self.generation()),
        }
    }
}
