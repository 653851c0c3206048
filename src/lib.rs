//! Schema metadata and value typing for Manifold column families.
//!
//! This crate holds the in-memory model of a column family definition and the
//! type system its column names and values are interpreted through.
//!
//! # Features
//!
//! - **Value types**: comparison, validation and literal parsing over raw byte
//!   payloads ([`AbstractType`]), resolved by name through a [`TypeRegistry`]
//! - **Metadata model**: immutable [`CfMetaData`] values with copy-on-write
//!   derivation, published to readers through a [`SchemaCache`]
//! - **RPC adapter**: conversion to and from Thrift-style definitions
//!   ([`thrift`]), limited to the columns such definitions can express
//! - **Schema rows**: the persisted row form of a definition
//!   ([`schema_rows`]), preserving every column
//!
//! # Example
//!
//! ```rust
//! use manifold_schema::{AbstractType, CfMetaData, ColumnDefinition, TypeRegistry};
//!
//! let cfm = CfMetaData::builder("Keyspace1", "Standard1")
//!     .default_validator(AbstractType::Ascii)
//!     .column(ColumnDefinition::regular("col1", AbstractType::Ascii))
//!     .column(ColumnDefinition::partition_key("key", AbstractType::Bytes, None))
//!     .build()?;
//!
//! // The RPC form drops the partition key column.
//! let rpc = cfm.to_rpc();
//! assert_eq!(rpc.column_metadata.len(), 1);
//!
//! // The row form keeps it.
//! let mutation = cfm.to_schema_mutation(1_000);
//! let restored = CfMetaData::from_schema(
//!     mutation.family_row().unwrap(),
//!     mutation.column_rows(),
//!     TypeRegistry::global(),
//! )?;
//! assert_eq!(restored, cfm);
//! # Ok::<(), manifold_schema::SchemaError>(())
//! ```

pub mod error;
pub mod schema;
pub mod schema_rows;
pub mod thrift;
pub mod types;

pub use error::{MarshalError, SchemaError};
pub use schema::{
    CfMetaData, CfMetaDataBuilder, ColumnDefinition, ColumnFamilyType, ColumnKind,
    CompressionParameters, IndexType, SchemaCache,
};
pub use schema_rows::{Cell, Row, RowDeletion, RowOperation, SchemaMutation, SchemaTable, load_schema};
pub use thrift::{RpcColumnDef, RpcDefinition};
pub use types::{
    AbstractType, AsciiSerializer, BooleanSerializer, BytesSerializer, CellValue, Cql3Type,
    DoubleSerializer, Int32Serializer, LongSerializer, TimestampSerializer, TypeRegistry,
    TypeSerializer, Utf8Serializer, UuidSerializer,
};
