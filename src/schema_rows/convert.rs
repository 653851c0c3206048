use std::collections::HashMap;

use super::{Row, RowDeletion, RowOperation, SchemaMutation, SchemaTable};
use crate::error::{MarshalError, SchemaError};
use crate::schema::compression::{options_from_json, options_to_json};
use crate::schema::{
    CfMetaData, ColumnDefinition, ColumnFamilyType, ColumnKind, CompressionParameters, IndexType,
};
use crate::types::{
    BytesSerializer, DoubleSerializer, Int32Serializer, LongSerializer, TypeRegistry,
    Utf8Serializer, UuidSerializer,
};

pub(crate) const KEYSPACE_NAME: &str = "keyspace_name";
pub(crate) const COLUMNFAMILY_NAME: &str = "columnfamily_name";

const CF_ID: &str = "cf_id";
const TYPE: &str = "type";
const COMPARATOR: &str = "comparator";
const KEY_VALIDATOR: &str = "key_validator";
const DEFAULT_VALIDATOR: &str = "default_validator";
const COMMENT: &str = "comment";
const COMPRESSION_PARAMETERS: &str = "compression_parameters";
const GC_GRACE_SECONDS: &str = "gc_grace_seconds";
const DEFAULT_TIME_TO_LIVE: &str = "default_time_to_live";
const READ_REPAIR_CHANCE: &str = "read_repair_chance";
const MIN_COMPACTION_THRESHOLD: &str = "min_compaction_threshold";
const MAX_COMPACTION_THRESHOLD: &str = "max_compaction_threshold";
const GENERATION: &str = "generation";

const COLUMN_NAME: &str = "column_name";
const VALIDATOR: &str = "validator";
const COMPONENT_INDEX: &str = "component_index";
const INDEX_NAME: &str = "index_name";
const INDEX_TYPE: &str = "index_type";
const INDEX_OPTIONS: &str = "index_options";

impl SchemaMutation {
    /// The rows describing `cfm` in full, every cell stamped with `timestamp`.
    pub fn from_metadata(cfm: &CfMetaData, timestamp: i64) -> Self {
        let mut mutation = SchemaMutation::new(cfm.ks_name(), timestamp);
        mutation.add(RowOperation::Upsert(family_row(cfm, timestamp)));
        for column in cfm.columns() {
            mutation.add(RowOperation::Upsert(column_row(cfm, column, timestamp)));
        }
        mutation
    }
}

impl CfMetaData {
    /// Encodes this definition as schema rows: one family row plus one row per
    /// column, RPC-incompatible columns included.
    pub fn to_schema_mutation(&self, timestamp: i64) -> SchemaMutation {
        SchemaMutation::from_metadata(self, timestamp)
    }

    /// Rows turning the persisted form of `self` into that of `new`: the full
    /// encoding of `new` plus deletions of the columns `new` no longer has.
    pub fn to_schema_update(&self, new: &CfMetaData, timestamp: i64) -> SchemaMutation {
        let mut mutation = new.to_schema_mutation(timestamp);
        for column in self.columns() {
            if new.column(column.name()).is_none() {
                mutation.add(RowOperation::Delete(RowDeletion {
                    table: SchemaTable::Columns,
                    family: new.cf_name().to_string(),
                    column: Some(column.name().to_vec()),
                    timestamp,
                }));
            }
        }
        mutation
    }

    /// Deletions of the family row and of every column row.
    pub fn drop_from_schema(&self, timestamp: i64) -> SchemaMutation {
        let mut mutation = SchemaMutation::new(self.ks_name(), timestamp);
        mutation.add(RowOperation::Delete(RowDeletion {
            table: SchemaTable::ColumnFamilies,
            family: self.cf_name().to_string(),
            column: None,
            timestamp,
        }));
        for column in self.columns() {
            mutation.add(RowOperation::Delete(RowDeletion {
                table: SchemaTable::Columns,
                family: self.cf_name().to_string(),
                column: Some(column.name().to_vec()),
                timestamp,
            }));
        }
        mutation
    }

    /// Decodes a `schema_columnfamilies` row. The result has no columns; add
    /// them with [`merge_column_rows`](Self::merge_column_rows).
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] if a comparator or validator name is not registered
    /// - [`SchemaError::MalformedValue`] if a cell does not decode
    /// - [`SchemaError::MissingField`] if a required cell is absent
    pub fn from_family_row(row: &Row, registry: &TypeRegistry) -> Result<Self, SchemaError> {
        expect_table(row, SchemaTable::ColumnFamilies)?;

        let keyspace = row.require(KEYSPACE_NAME, Utf8Serializer)?;
        let family = row.require(COLUMNFAMILY_NAME, Utf8Serializer)?;

        let mut builder = CfMetaData::builder(keyspace, family)
            .comparator(registry.resolve(&row.require(COMPARATOR, Utf8Serializer)?)?)
            .key_validator(registry.resolve(&row.require(KEY_VALIDATOR, Utf8Serializer)?)?)
            .default_validator(
                registry.resolve(&row.require(DEFAULT_VALIDATOR, Utf8Serializer)?)?,
            );

        if let Some(id) = row.get(CF_ID, UuidSerializer)? {
            builder = builder.id(id);
        }
        if let Some(cf_type) = row.get(TYPE, Utf8Serializer)? {
            builder = builder.cf_type(ColumnFamilyType::parse(&cf_type)?);
        }
        if let Some(comment) = row.get(COMMENT, Utf8Serializer)? {
            builder = builder.comment(comment);
        }
        if let Some(json) = row.get(COMPRESSION_PARAMETERS, Utf8Serializer)? {
            builder = builder.compression(CompressionParameters::from_json(&json)?);
        }
        if let Some(seconds) = row.get(GC_GRACE_SECONDS, Int32Serializer)? {
            builder = builder.gc_grace_seconds(seconds);
        }
        if let Some(ttl) = row.get(DEFAULT_TIME_TO_LIVE, Int32Serializer)? {
            builder = builder.default_time_to_live(ttl);
        }
        if let Some(chance) = row.get(READ_REPAIR_CHANCE, DoubleSerializer)? {
            builder = builder.read_repair_chance(chance);
        }
        let min = row.get(MIN_COMPACTION_THRESHOLD, Int32Serializer)?;
        let max = row.get(MAX_COMPACTION_THRESHOLD, Int32Serializer)?;
        if let (Some(min), Some(max)) = (min, max) {
            builder = builder.compaction_thresholds(min, max);
        }
        if let Some(generation) = row.get(GENERATION, LongSerializer)? {
            builder = builder.generation(generation);
        }

        builder.build()
    }

    /// Decodes `rows` as `schema_columns` rows and returns a copy of `self`
    /// holding those columns as well. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] if a validator name is not registered
    /// - [`SchemaError::DuplicateColumn`] if a column name is claimed twice
    /// - [`SchemaError::InvalidConfiguration`] if a row belongs to another family
    pub fn merge_column_rows<'a>(
        &self,
        rows: impl IntoIterator<Item = &'a Row>,
        registry: &TypeRegistry,
    ) -> Result<Self, SchemaError> {
        let mut merged = self.clone();
        for row in rows {
            expect_table(row, SchemaTable::Columns)?;
            let keyspace = row.require(KEYSPACE_NAME, Utf8Serializer)?;
            let family = row.require(COLUMNFAMILY_NAME, Utf8Serializer)?;
            if keyspace != self.ks_name() || family != self.cf_name() {
                return Err(SchemaError::InvalidConfiguration(format!(
                    "column row of {keyspace}.{family} cannot be merged into {}.{}",
                    self.ks_name(),
                    self.cf_name()
                )));
            }
            merged.insert_column(column_from_row(row, registry)?)?;
        }
        Ok(merged)
    }

    /// Decodes a family row together with its column rows.
    pub fn from_schema<'a>(
        family_row: &Row,
        column_rows: impl IntoIterator<Item = &'a Row>,
        registry: &TypeRegistry,
    ) -> Result<Self, SchemaError> {
        CfMetaData::from_family_row(family_row, registry)?.merge_column_rows(column_rows, registry)
    }
}

/// Decodes every family of a schema read at startup.
///
/// Column rows are matched to family rows by keyspace and family name. Column
/// rows whose family has no row are skipped. Families come back in the order
/// of `family_rows`.
pub fn load_schema(
    family_rows: &[Row],
    column_rows: &[Row],
    registry: &TypeRegistry,
) -> Result<Vec<CfMetaData>, SchemaError> {
    let mut columns_by_family: HashMap<(String, String), Vec<&Row>> = HashMap::new();
    for row in column_rows {
        let key = (
            row.require(KEYSPACE_NAME, Utf8Serializer)?,
            row.require(COLUMNFAMILY_NAME, Utf8Serializer)?,
        );
        columns_by_family.entry(key).or_default().push(row);
    }

    let mut families = Vec::with_capacity(family_rows.len());
    for row in family_rows {
        let cfm = CfMetaData::from_family_row(row, registry)?;
        let key = (cfm.ks_name().to_string(), cfm.cf_name().to_string());
        let columns = columns_by_family.remove(&key).unwrap_or_default();

        #[cfg(feature = "logging")]
        log::debug!(
            "Loaded {}.{} with {} column rows",
            key.0,
            key.1,
            columns.len()
        );

        families.push(cfm.merge_column_rows(columns, registry)?);
    }

    #[cfg(feature = "logging")]
    for (keyspace, family) in columns_by_family.keys() {
        log::warn!("Ignoring column rows of unknown column family {keyspace}.{family}");
    }

    Ok(families)
}

fn expect_table(row: &Row, table: SchemaTable) -> Result<(), SchemaError> {
    if row.table() != table {
        return Err(SchemaError::InvalidConfiguration(format!(
            "expected a row of {table}, got a row of {}",
            row.table()
        )));
    }
    Ok(())
}

fn key_row(table: SchemaTable, cfm: &CfMetaData, timestamp: i64) -> Row {
    let mut row = Row::new(table);
    row.set(KEYSPACE_NAME, Utf8Serializer, &cfm.ks_name().to_string(), timestamp);
    row.set(COLUMNFAMILY_NAME, Utf8Serializer, &cfm.cf_name().to_string(), timestamp);
    row
}

fn family_row(cfm: &CfMetaData, timestamp: i64) -> Row {
    let mut row = key_row(SchemaTable::ColumnFamilies, cfm, timestamp);
    row.set(CF_ID, UuidSerializer, &cfm.cf_id(), timestamp);
    row.set(TYPE, Utf8Serializer, &cfm.cf_type().as_str().to_string(), timestamp);
    row.set(COMPARATOR, Utf8Serializer, &cfm.comparator().class_name(), timestamp);
    row.set(KEY_VALIDATOR, Utf8Serializer, &cfm.key_validator().class_name(), timestamp);
    row.set(
        DEFAULT_VALIDATOR,
        Utf8Serializer,
        &cfm.default_validator().class_name(),
        timestamp,
    );
    row.set(COMMENT, Utf8Serializer, &cfm.comment().to_string(), timestamp);
    row.set(
        COMPRESSION_PARAMETERS,
        Utf8Serializer,
        &cfm.compression().to_json(),
        timestamp,
    );
    row.set(GC_GRACE_SECONDS, Int32Serializer, &cfm.gc_grace_seconds(), timestamp);
    row.set(
        DEFAULT_TIME_TO_LIVE,
        Int32Serializer,
        &cfm.default_time_to_live(),
        timestamp,
    );
    row.set(
        READ_REPAIR_CHANCE,
        DoubleSerializer,
        &cfm.read_repair_chance(),
        timestamp,
    );
    row.set(
        MIN_COMPACTION_THRESHOLD,
        Int32Serializer,
        &cfm.min_compaction_threshold(),
        timestamp,
    );
    row.set(
        MAX_COMPACTION_THRESHOLD,
        Int32Serializer,
        &cfm.max_compaction_threshold(),
        timestamp,
    );
    row.set(GENERATION, LongSerializer, &cfm.generation(), timestamp);
    row
}

fn column_row(cfm: &CfMetaData, column: &ColumnDefinition, timestamp: i64) -> Row {
    let mut row = key_row(SchemaTable::Columns, cfm, timestamp);
    row.set(COLUMN_NAME, BytesSerializer, &column.name().to_vec(), timestamp);
    row.set(VALIDATOR, Utf8Serializer, &column.validator().class_name(), timestamp);
    row.set(TYPE, Utf8Serializer, &column.kind().as_str().to_string(), timestamp);
    row.set_optional(
        COMPONENT_INDEX,
        Int32Serializer,
        column.component_index().map(i32::from).as_ref(),
        timestamp,
    );
    row.set_optional(
        INDEX_NAME,
        Utf8Serializer,
        column.index_name().map(str::to_string).as_ref(),
        timestamp,
    );
    row.set_optional(
        INDEX_TYPE,
        Utf8Serializer,
        column.index_type().map(|t| t.as_str().to_string()).as_ref(),
        timestamp,
    );
    let options = (!column.index_options().is_empty())
        .then(|| options_to_json(column.index_options()));
    row.set_optional(INDEX_OPTIONS, Utf8Serializer, options.as_ref(), timestamp);
    row
}

fn column_from_row(row: &Row, registry: &TypeRegistry) -> Result<ColumnDefinition, SchemaError> {
    let name = row.require(COLUMN_NAME, BytesSerializer)?;
    let validator = registry.resolve(&row.require(VALIDATOR, Utf8Serializer)?)?;
    let kind = match row.get(TYPE, Utf8Serializer)? {
        Some(kind) => ColumnKind::parse(&kind)?,
        None => ColumnKind::Regular,
    };
    let component_index = row
        .get(COMPONENT_INDEX, Int32Serializer)?
        .map(|i| {
            u16::try_from(i).map_err(|_| {
                MarshalError::new(format!("{COMPONENT_INDEX} {i} is out of range"))
            })
        })
        .transpose()?;
    let index_type = row
        .get(INDEX_TYPE, Utf8Serializer)?
        .map(|t| IndexType::parse(&t))
        .transpose()?;
    let index_options = match row.get(INDEX_OPTIONS, Utf8Serializer)? {
        Some(json) => options_from_json(&json)?,
        None => Default::default(),
    };

    let mut column =
        ColumnDefinition::new(name, validator, kind).with_component_index(component_index);
    column.set_index_parts(row.get(INDEX_NAME, Utf8Serializer)?, index_type, index_options);
    Ok(column)
}
