//! Column family metadata: the canonical in-memory schema model.
//!
//! [`CfMetaData`] is the value every other representation is a projection of.
//! The RPC adapter ([`crate::thrift`]) and the schema-row adapter
//! ([`crate::schema_rows`]) convert to and from it; [`SchemaCache`] is where a
//! node publishes the definitions its readers see.

pub(crate) mod cache;
pub(crate) mod cf_metadata;
pub(crate) mod column_definition;
pub(crate) mod compression;

pub use cache::SchemaCache;
pub use cf_metadata::{
    CfMetaData, CfMetaDataBuilder, ColumnFamilyType, DEFAULT_GC_GRACE_SECONDS,
    DEFAULT_MAX_COMPACTION_THRESHOLD, DEFAULT_MIN_COMPACTION_THRESHOLD,
    DEFAULT_READ_REPAIR_CHANCE, DEFAULT_TIME_TO_LIVE, MAX_NAME_LENGTH,
};
pub use column_definition::{ColumnDefinition, ColumnKind, IndexType};
pub use compression::{
    CHUNK_LENGTH_KB, CompressionParameters, DEFAULT_CHUNK_LENGTH, DEFAULT_COMPRESSOR,
    SSTABLE_COMPRESSION,
};
