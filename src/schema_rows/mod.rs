//! Persisted form of schema metadata.
//!
//! A column family is stored as one row of the `schema_columnfamilies` table
//! plus one row per column in `schema_columns`. Every cell carries the write
//! timestamp supplied by the caller; concurrent schema edits are resolved by
//! that timestamp downstream, so producing a [`SchemaMutation`] is a pure
//! function of its inputs. Applying the mutation durably is the job of the
//! storage write path.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MarshalError, SchemaError};
use crate::types::TypeSerializer;

pub(crate) mod convert;

pub use convert::load_schema;

/// The schema tables a column family is persisted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaTable {
    ColumnFamilies,
    Columns,
}

impl SchemaTable {
    pub fn name(self) -> &'static str {
        match self {
            SchemaTable::ColumnFamilies => "schema_columnfamilies",
            SchemaTable::Columns => "schema_columns",
        }
    }
}

impl fmt::Display for SchemaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One stored value. A cell without a value is a tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    value: Option<Vec<u8>>,
    timestamp: i64,
}

impl Cell {
    pub fn live(value: Vec<u8>, timestamp: i64) -> Self {
        Self {
            value: Some(value),
            timestamp,
        }
    }

    pub fn tombstone(timestamp: i64) -> Self {
        Self {
            value: None,
            timestamp,
        }
    }

    pub fn is_live(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// A row of one schema table: named cells, decoded through the type serializers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    table: SchemaTable,
    cells: BTreeMap<String, Cell>,
}

impl Row {
    pub fn new(table: SchemaTable) -> Self {
        Self {
            table,
            cells: BTreeMap::new(),
        }
    }

    pub fn table(&self) -> SchemaTable {
        self.table
    }

    /// Writes `value` encoded by `serializer`.
    pub fn set<S: TypeSerializer>(
        &mut self,
        name: &str,
        serializer: S,
        value: &S::Value,
        timestamp: i64,
    ) {
        self.set_bytes(name, serializer.serialize(value), timestamp);
    }

    /// Writes an already encoded value.
    pub fn set_bytes(&mut self, name: &str, value: Vec<u8>, timestamp: i64) {
        self.cells
            .insert(name.to_string(), Cell::live(value, timestamp));
    }

    /// Writes `value` when present, a tombstone otherwise.
    pub fn set_optional<S: TypeSerializer>(
        &mut self,
        name: &str,
        serializer: S,
        value: Option<&S::Value>,
        timestamp: i64,
    ) {
        match value {
            Some(value) => self.set(name, serializer, value, timestamp),
            None => self.delete_cell(name, timestamp),
        }
    }

    pub fn delete_cell(&mut self, name: &str, timestamp: i64) {
        self.cells
            .insert(name.to_string(), Cell::tombstone(timestamp));
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    /// Cells ordered by name.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    /// Decodes the cell `name`. Absent cells and tombstones read as `None`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MalformedValue`] if the stored bytes do not decode.
    pub fn get<S: TypeSerializer>(
        &self,
        name: &str,
        serializer: S,
    ) -> Result<Option<S::Value>, SchemaError> {
        let Some(bytes) = self.cells.get(name).and_then(Cell::value) else {
            return Ok(None);
        };
        serializer.deserialize(bytes).map(Some).map_err(|e| {
            SchemaError::MalformedValue(MarshalError::new(format!(
                "invalid value for '{name}' in {}: {}",
                self.table,
                e.message()
            )))
        })
    }

    /// Like [`get`](Self::get), failing with [`SchemaError::MissingField`]
    /// when the cell holds no value.
    pub fn require<S: TypeSerializer>(
        &self,
        name: &str,
        serializer: S,
    ) -> Result<S::Value, SchemaError> {
        self.get(name, serializer)?
            .ok_or_else(|| SchemaError::MissingField {
                table: self.table.name().to_string(),
                field: name.to_string(),
            })
    }
}

/// Deletion of a whole schema row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDeletion {
    pub table: SchemaTable,
    pub family: String,
    /// Set for `schema_columns` rows.
    pub column: Option<Vec<u8>>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOperation {
    Upsert(Row),
    Delete(RowDeletion),
}

impl RowOperation {
    pub fn table(&self) -> SchemaTable {
        match self {
            RowOperation::Upsert(row) => row.table(),
            RowOperation::Delete(deletion) => deletion.table,
        }
    }
}

/// Atomic batch of schema row changes within one keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMutation {
    keyspace: String,
    timestamp: i64,
    operations: BTreeMap<SchemaTable, Vec<RowOperation>>,
}

impl SchemaMutation {
    pub fn new(keyspace: impl Into<String>, timestamp: i64) -> Self {
        Self {
            keyspace: keyspace.into(),
            timestamp,
            operations: BTreeMap::new(),
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn add(&mut self, operation: RowOperation) {
        self.operations
            .entry(operation.table())
            .or_default()
            .push(operation);
    }

    pub fn is_empty(&self) -> bool {
        self.operations.values().all(Vec::is_empty)
    }

    /// Operations on `table`, in the order they were added.
    pub fn operations(&self, table: SchemaTable) -> &[RowOperation] {
        self.operations.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn upserts(&self, table: SchemaTable) -> impl Iterator<Item = &Row> {
        self.operations(table).iter().filter_map(|op| match op {
            RowOperation::Upsert(row) => Some(row),
            RowOperation::Delete(_) => None,
        })
    }

    pub fn deletions(&self, table: SchemaTable) -> impl Iterator<Item = &RowDeletion> {
        self.operations(table).iter().filter_map(|op| match op {
            RowOperation::Delete(deletion) => Some(deletion),
            RowOperation::Upsert(_) => None,
        })
    }

    /// The first upserted `schema_columnfamilies` row.
    pub fn family_row(&self) -> Option<&Row> {
        self.upserts(SchemaTable::ColumnFamilies).next()
    }

    /// Every upserted `schema_columns` row.
    pub fn column_rows(&self) -> Vec<&Row> {
        self.upserts(SchemaTable::Columns).collect()
    }

    /// CRC32 of the mutation content. Timestamps are left out, so the same
    /// schema written at different times has the same digest.
    pub fn digest(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        update_field(&mut hasher, self.keyspace.as_bytes());
        for (table, operations) in &self.operations {
            update_field(&mut hasher, table.name().as_bytes());
            for operation in operations {
                match operation {
                    RowOperation::Upsert(row) => {
                        hasher.update(&[0]);
                        for (name, cell) in row.cells() {
                            update_field(&mut hasher, name.as_bytes());
                            match cell.value() {
                                Some(value) => {
                                    hasher.update(&[1]);
                                    update_field(&mut hasher, value);
                                }
                                None => hasher.update(&[0]),
                            }
                        }
                    }
                    RowOperation::Delete(deletion) => {
                        hasher.update(&[1]);
                        update_field(&mut hasher, deletion.family.as_bytes());
                        if let Some(column) = &deletion.column {
                            update_field(&mut hasher, column);
                        }
                    }
                }
            }
        }
        hasher.finalize()
    }
}

// Length-prefixed so adjacent fields cannot run into each other.
fn update_field(hasher: &mut crc32fast::Hasher, bytes: &[u8]) {
    let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    hasher.update(&len.to_le_bytes());
    hasher.update(bytes);
}
