use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use super::column_definition::{ColumnDefinition, ColumnKind};
use super::compression::CompressionParameters;
use crate::error::SchemaError;
use crate::types::AbstractType;

/// Longest keyspace, family or index name accepted by [`CfMetaData::validate`].
pub const MAX_NAME_LENGTH: usize = 48;

pub const DEFAULT_GC_GRACE_SECONDS: i32 = 864_000;
pub const DEFAULT_TIME_TO_LIVE: i32 = 0;
pub const DEFAULT_READ_REPAIR_CHANCE: f64 = 0.1;
pub const DEFAULT_MIN_COMPACTION_THRESHOLD: i32 = 4;
pub const DEFAULT_MAX_COMPACTION_THRESHOLD: i32 = 32;

/// Storage layout of a column family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnFamilyType {
    Standard,
    Super,
}

impl ColumnFamilyType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnFamilyType::Standard => "Standard",
            ColumnFamilyType::Super => "Super",
        }
    }

    pub fn parse(value: &str) -> Result<Self, SchemaError> {
        match value {
            "Standard" => Ok(ColumnFamilyType::Standard),
            "Super" => Ok(ColumnFamilyType::Super),
            _ => Err(SchemaError::InvalidConfiguration(format!(
                "invalid column family type '{value}'"
            ))),
        }
    }
}

impl fmt::Display for ColumnFamilyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of one column family.
///
/// A `CfMetaData` is an immutable value once built. Every change goes through a
/// method that returns a new value (copy-then-modify), so an instance already
/// handed to readers is never altered; publishing the new value is up to the
/// caller (see [`SchemaCache`](super::SchemaCache)).
///
/// Equality is structural: two independently built values with the same
/// fields are equal, whatever order their columns were added in.
#[derive(Debug, Clone, PartialEq)]
pub struct CfMetaData {
    ks_name: String,
    cf_name: String,
    cf_id: Uuid,
    cf_type: ColumnFamilyType,
    /// Orders column names.
    comparator: AbstractType,
    /// Orders row keys.
    key_validator: AbstractType,
    default_validator: AbstractType,
    columns: Arc<BTreeMap<Vec<u8>, ColumnDefinition>>,
    comment: String,
    compression: CompressionParameters,
    gc_grace_seconds: i32,
    default_time_to_live: i32,
    read_repair_chance: f64,
    min_compaction_threshold: i32,
    max_compaction_threshold: i32,
    generation: i64,
}

impl CfMetaData {
    /// Starts building the metadata of `keyspace.family`.
    pub fn builder(keyspace: impl Into<String>, family: impl Into<String>) -> CfMetaDataBuilder {
        CfMetaDataBuilder::new(keyspace, family)
    }

    /// Id assigned to a family that was created without an explicit one.
    pub fn default_id(keyspace: &str, family: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{keyspace}.{family}").as_bytes())
    }

    pub fn ks_name(&self) -> &str {
        &self.ks_name
    }

    pub fn cf_name(&self) -> &str {
        &self.cf_name
    }

    pub fn cf_id(&self) -> Uuid {
        self.cf_id
    }

    pub fn cf_type(&self) -> ColumnFamilyType {
        self.cf_type
    }

    pub fn comparator(&self) -> AbstractType {
        self.comparator
    }

    pub fn key_validator(&self) -> AbstractType {
        self.key_validator
    }

    pub fn default_validator(&self) -> AbstractType {
        self.default_validator
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn compression(&self) -> &CompressionParameters {
        &self.compression
    }

    pub fn gc_grace_seconds(&self) -> i32 {
        self.gc_grace_seconds
    }

    pub fn default_time_to_live(&self) -> i32 {
        self.default_time_to_live
    }

    pub fn read_repair_chance(&self) -> f64 {
        self.read_repair_chance
    }

    pub fn min_compaction_threshold(&self) -> i32 {
        self.min_compaction_threshold
    }

    pub fn max_compaction_threshold(&self) -> i32 {
        self.max_compaction_threshold
    }

    pub fn generation(&self) -> i64 {
        self.generation
    }

    pub fn column(&self, name: &[u8]) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    /// All columns, ordered by raw name bytes.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn regular_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns_of_kind(ColumnKind::Regular)
    }

    pub fn static_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns_of_kind(ColumnKind::Static)
    }

    /// Partition key columns in component order.
    pub fn partition_key_columns(&self) -> Vec<&ColumnDefinition> {
        self.key_columns(ColumnKind::PartitionKey)
    }

    /// Clustering columns in component order.
    pub fn clustering_columns(&self) -> Vec<&ColumnDefinition> {
        self.key_columns(ColumnKind::ClusteringKey)
    }

    fn columns_of_kind(&self, kind: ColumnKind) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.values().filter(move |c| c.kind() == kind)
    }

    fn key_columns(&self, kind: ColumnKind) -> Vec<&ColumnDefinition> {
        let mut columns: Vec<_> = self.columns_of_kind(kind).collect();
        columns.sort_by_key(|c| c.component_index().unwrap_or(0));
        columns
    }

    /// A copy under a new family name. The id is kept, so the copy is the
    /// same family as far as the cluster is concerned.
    #[must_use]
    pub fn rename(&self, new_name: impl Into<String>) -> Self {
        Self {
            cf_name: new_name.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_comment(&self, comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_compression(&self, compression: CompressionParameters) -> Self {
        Self {
            compression,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_generation(&self, generation: i64) -> Self {
        Self {
            generation,
            ..self.clone()
        }
    }

    /// A copy with `column` added, replacing any column of the same name.
    #[must_use]
    pub fn with_column(&self, column: ColumnDefinition) -> Self {
        let mut copy = self.clone();
        Arc::make_mut(&mut copy.columns).insert(column.name().to_vec(), column);
        copy
    }

    #[must_use]
    pub fn without_column(&self, name: &[u8]) -> Self {
        let mut copy = self.clone();
        if copy.columns.contains_key(name) {
            Arc::make_mut(&mut copy.columns).remove(name);
        }
        copy
    }

    /// The projection an RPC definition can express: only columns for which
    /// [`ColumnDefinition::is_rpc_compatible`] holds.
    #[must_use]
    pub fn rpc_compatible(&self) -> Self {
        let columns = self
            .columns
            .iter()
            .filter(|(_, column)| column.is_rpc_compatible())
            .map(|(name, column)| (name.clone(), column.clone()))
            .collect();
        Self {
            columns: Arc::new(columns),
            ..self.clone()
        }
    }

    /// Adds `column` in place. Only for values nobody else has seen yet.
    pub(crate) fn insert_column(&mut self, column: ColumnDefinition) -> Result<(), SchemaError> {
        if self.columns.contains_key(column.name()) {
            return Err(SchemaError::DuplicateColumn {
                keyspace: self.ks_name.clone(),
                table: self.cf_name.clone(),
                column: column.name_lossy(),
            });
        }
        Arc::make_mut(&mut self.columns).insert(column.name().to_vec(), column);
        Ok(())
    }

    /// Applies an altered definition of this family.
    ///
    /// The update must describe the same family (keyspace, name, id and type)
    /// and may only change the comparator and key validator in compatible
    /// ways. The result takes every other field from `update` and a generation
    /// greater than this one's. A family already at `i64::MAX` cannot be
    /// altered further.
    pub fn apply_update(&self, update: &CfMetaData) -> Result<Self, SchemaError> {
        if update.ks_name != self.ks_name {
            return Err(SchemaError::InvalidConfiguration(format!(
                "keyspace mismatch ({} != {})",
                self.ks_name, update.ks_name
            )));
        }
        if update.cf_name != self.cf_name {
            return Err(SchemaError::InvalidConfiguration(format!(
                "column family mismatch ({} != {})",
                self.cf_name, update.cf_name
            )));
        }
        if update.cf_id != self.cf_id {
            return Err(SchemaError::InvalidConfiguration(format!(
                "column family id mismatch ({} != {})",
                self.cf_id, update.cf_id
            )));
        }
        if update.cf_type != self.cf_type {
            return Err(SchemaError::InvalidConfiguration(format!(
                "column family types do not match ({} != {})",
                self.cf_type, update.cf_type
            )));
        }
        if !update.comparator.is_compatible_with(self.comparator) {
            return Err(SchemaError::InvalidConfiguration(format!(
                "comparator {} is not compatible with {}",
                update.comparator, self.comparator
            )));
        }
        if !update.key_validator.is_value_compatible_with(self.key_validator) {
            return Err(SchemaError::InvalidConfiguration(format!(
                "key validator {} is not compatible with {}",
                update.key_validator, self.key_validator
            )));
        }

        let next = self.generation.checked_add(1).ok_or_else(|| {
            SchemaError::InvalidConfiguration(format!(
                "generation of {}.{} is exhausted",
                self.ks_name, self.cf_name
            ))
        })?;
        Ok(Self {
            generation: update.generation.max(next),
            ..update.clone()
        })
    }

    /// Checks the schema rules a definition must satisfy before it is accepted.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !is_valid_name(&self.ks_name) {
            return Err(SchemaError::InvalidConfiguration(format!(
                "invalid keyspace name '{}': must be 1 to {MAX_NAME_LENGTH} word characters",
                self.ks_name
            )));
        }
        if !is_valid_name(&self.cf_name) {
            return Err(SchemaError::InvalidConfiguration(format!(
                "invalid column family name '{}': must be 1 to {MAX_NAME_LENGTH} word characters",
                self.cf_name
            )));
        }
        if self.gc_grace_seconds < 0 {
            return Err(SchemaError::InvalidConfiguration(
                "gc_grace_seconds must be non-negative".to_string(),
            ));
        }
        if self.default_time_to_live < 0 {
            return Err(SchemaError::InvalidConfiguration(
                "default_time_to_live must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.read_repair_chance) {
            return Err(SchemaError::InvalidConfiguration(format!(
                "read_repair_chance must be between 0.0 and 1.0, got {}",
                self.read_repair_chance
            )));
        }
        self.validate_compaction_thresholds()?;
        self.compression.validate()?;

        let mut index_names = HashSet::new();
        for column in self.columns.values() {
            if column.name().is_empty() {
                return Err(SchemaError::InvalidConfiguration(format!(
                    "column names in {}.{} must not be empty",
                    self.ks_name, self.cf_name
                )));
            }
            if self.comparator.validate(column.name()).is_err() {
                return Err(SchemaError::InvalidConfiguration(format!(
                    "column name '{}' is not valid for comparator {}",
                    column.name_lossy(),
                    self.comparator
                )));
            }
            if let Some(index_name) = column.index_name() {
                if column.index_type().is_none() {
                    return Err(SchemaError::InvalidConfiguration(format!(
                        "index '{index_name}' on column '{}' has no index type",
                        column.name_lossy()
                    )));
                }
                if !is_valid_name(index_name) {
                    return Err(SchemaError::InvalidConfiguration(format!(
                        "illegal index name '{index_name}'"
                    )));
                }
                if !index_names.insert(index_name) {
                    return Err(SchemaError::InvalidConfiguration(format!(
                        "duplicate index name '{index_name}'"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_compaction_thresholds(&self) -> Result<(), SchemaError> {
        let (min, max) = (self.min_compaction_threshold, self.max_compaction_threshold);
        // A minimum of 0 disables compaction.
        if min == 0 {
            return Ok(());
        }
        if min < 2 || max < 2 {
            return Err(SchemaError::InvalidConfiguration(format!(
                "compaction thresholds must be at least 2 (min {min}, max {max})"
            )));
        }
        if min > max {
            return Err(SchemaError::InvalidConfiguration(format!(
                "min_compaction_threshold ({min}) cannot be greater than max_compaction_threshold ({max})"
            )));
        }
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LENGTH
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Builder for [`CfMetaData`].
///
/// # Example
///
/// ```rust
/// use manifold_schema::{AbstractType, CfMetaData, ColumnDefinition};
///
/// let cfm = CfMetaData::builder("Keyspace1", "Standard1")
///     .default_validator(AbstractType::Ascii)
///     .comment("Test comment")
///     .column(ColumnDefinition::regular("col1", AbstractType::Ascii))
///     .build()?;
///
/// assert_eq!(cfm.column_count(), 1);
/// # Ok::<(), manifold_schema::SchemaError>(())
/// ```
pub struct CfMetaDataBuilder {
    ks_name: String,
    cf_name: String,
    cf_id: Option<Uuid>,
    cf_type: ColumnFamilyType,
    comparator: AbstractType,
    key_validator: AbstractType,
    default_validator: AbstractType,
    columns: Vec<ColumnDefinition>,
    comment: String,
    compression: CompressionParameters,
    gc_grace_seconds: i32,
    default_time_to_live: i32,
    read_repair_chance: f64,
    min_compaction_threshold: i32,
    max_compaction_threshold: i32,
    generation: i64,
}

impl CfMetaDataBuilder {
    /// Creates a builder with default table options, `BytesType` for every
    /// comparator and validator, and no columns.
    pub fn new(keyspace: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            ks_name: keyspace.into(),
            cf_name: family.into(),
            cf_id: None,
            cf_type: ColumnFamilyType::Standard,
            comparator: AbstractType::Bytes,
            key_validator: AbstractType::Bytes,
            default_validator: AbstractType::Bytes,
            columns: Vec::new(),
            comment: String::new(),
            compression: CompressionParameters::default(),
            gc_grace_seconds: DEFAULT_GC_GRACE_SECONDS,
            default_time_to_live: DEFAULT_TIME_TO_LIVE,
            read_repair_chance: DEFAULT_READ_REPAIR_CHANCE,
            min_compaction_threshold: DEFAULT_MIN_COMPACTION_THRESHOLD,
            max_compaction_threshold: DEFAULT_MAX_COMPACTION_THRESHOLD,
            generation: 0,
        }
    }

    /// Sets the family id. Defaults to [`CfMetaData::default_id`].
    #[must_use]
    pub fn id(mut self, id: Uuid) -> Self {
        self.cf_id = Some(id);
        self
    }

    #[must_use]
    pub fn cf_type(mut self, cf_type: ColumnFamilyType) -> Self {
        self.cf_type = cf_type;
        self
    }

    #[must_use]
    pub fn comparator(mut self, comparator: AbstractType) -> Self {
        self.comparator = comparator;
        self
    }

    #[must_use]
    pub fn key_validator(mut self, key_validator: AbstractType) -> Self {
        self.key_validator = key_validator;
        self
    }

    #[must_use]
    pub fn default_validator(mut self, default_validator: AbstractType) -> Self {
        self.default_validator = default_validator;
        self
    }

    #[must_use]
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnDefinition>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn compression(mut self, compression: CompressionParameters) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn gc_grace_seconds(mut self, seconds: i32) -> Self {
        self.gc_grace_seconds = seconds;
        self
    }

    #[must_use]
    pub fn default_time_to_live(mut self, seconds: i32) -> Self {
        self.default_time_to_live = seconds;
        self
    }

    #[must_use]
    pub fn read_repair_chance(mut self, chance: f64) -> Self {
        self.read_repair_chance = chance;
        self
    }

    #[must_use]
    pub fn compaction_thresholds(mut self, min: i32, max: i32) -> Self {
        self.min_compaction_threshold = min;
        self.max_compaction_threshold = max;
        self
    }

    #[must_use]
    pub fn generation(mut self, generation: i64) -> Self {
        self.generation = generation;
        self
    }

    /// Builds the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateColumn`] if two columns share a name.
    /// Schema rules are checked separately by [`CfMetaData::validate`].
    pub fn build(self) -> Result<CfMetaData, SchemaError> {
        let cf_id = self
            .cf_id
            .unwrap_or_else(|| CfMetaData::default_id(&self.ks_name, &self.cf_name));

        let mut cfm = CfMetaData {
            ks_name: self.ks_name,
            cf_name: self.cf_name,
            cf_id,
            cf_type: self.cf_type,
            comparator: self.comparator,
            key_validator: self.key_validator,
            default_validator: self.default_validator,
            columns: Arc::new(BTreeMap::new()),
            comment: self.comment,
            compression: self.compression,
            gc_grace_seconds: self.gc_grace_seconds,
            default_time_to_live: self.default_time_to_live,
            read_repair_chance: self.read_repair_chance,
            min_compaction_threshold: self.min_compaction_threshold,
            max_compaction_threshold: self.max_compaction_threshold,
            generation: self.generation,
        };
        for column in self.columns {
            cfm.insert_column(column)?;
        }
        Ok(cfm)
    }
}
