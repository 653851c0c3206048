use std::error::Error;

use manifold_schema::{
    AbstractType, CfMetaData, ColumnDefinition, MarshalError, RpcColumnDef, RpcDefinition,
    SchemaError, TypeRegistry, Utf8Serializer,
};

fn family() -> CfMetaData {
    CfMetaData::builder("Keyspace1", "Standard1")
        .column(ColumnDefinition::regular("col1", AbstractType::Ascii))
        .column(ColumnDefinition::partition_key("key", AbstractType::Bytes, None))
        .build()
        .unwrap()
}

#[test]
fn test_unknown_validator_in_rpc_column() {
    let mut def = RpcDefinition::new("Keyspace1", "Standard1");
    def.column_metadata
        .push(RpcColumnDef::new("col1", "org.apache.cassandra.db.marshal.FancyType"));

    match CfMetaData::from_rpc(&def, TypeRegistry::global()) {
        Err(SchemaError::UnknownType(name)) => {
            assert_eq!(name, "org.apache.cassandra.db.marshal.FancyType");
        }
        other => panic!("Expected UnknownType, got {other:?}"),
    }
}

#[test]
fn test_unknown_comparator_in_rpc_definition() {
    let mut def = RpcDefinition::new("Keyspace1", "Standard1");
    def.comparator_type = Some("NoSuchType".to_string());
    assert!(matches!(
        CfMetaData::from_rpc(&def, TypeRegistry::global()),
        Err(SchemaError::UnknownType(_))
    ));
}

#[test]
fn test_unknown_validator_in_column_row() {
    let cfm = family();
    let mutation = cfm.to_schema_mutation(1);
    let mut row = mutation.column_rows()[0].clone();
    row.set("validator", Utf8Serializer, &"com.example.Missing".to_string(), 1);

    let base = CfMetaData::from_family_row(mutation.family_row().unwrap(), TypeRegistry::global())
        .unwrap();
    assert!(matches!(
        base.merge_column_rows([&row], TypeRegistry::global()),
        Err(SchemaError::UnknownType(_))
    ));
}

#[test]
fn test_unknown_comparator_in_family_row() {
    let mutation = family().to_schema_mutation(1);
    let mut row = mutation.family_row().unwrap().clone();
    row.set("comparator", Utf8Serializer, &"com.example.Missing".to_string(), 1);
    assert!(matches!(
        CfMetaData::from_family_row(&row, TypeRegistry::global()),
        Err(SchemaError::UnknownType(_))
    ));
}

#[test]
fn test_unknown_type_with_restricted_registry() {
    let mut registry = TypeRegistry::new();
    registry.register(AbstractType::Bytes.class_name(), AbstractType::Bytes);

    let mutation = family().to_schema_mutation(1);
    let result = CfMetaData::from_schema(
        mutation.family_row().unwrap(),
        mutation.column_rows(),
        &registry,
    );
    match result {
        Err(SchemaError::UnknownType(name)) => assert_eq!(name, AbstractType::Ascii.class_name()),
        other => panic!("Expected UnknownType, got {other:?}"),
    }
}

#[test]
fn test_duplicate_column_rows() {
    let cfm = family();
    let mutation = cfm.to_schema_mutation(1);
    let rows = mutation.column_rows();
    let duplicated = [rows[0], rows[1], rows[0]];

    let base = CfMetaData::from_family_row(mutation.family_row().unwrap(), TypeRegistry::global())
        .unwrap();
    match base.merge_column_rows(duplicated, TypeRegistry::global()) {
        Err(SchemaError::DuplicateColumn {
            keyspace,
            table,
            column,
        }) => {
            assert_eq!(keyspace, "Keyspace1");
            assert_eq!(table, "Standard1");
            assert_eq!(column, "col1");
        }
        other => panic!("Expected DuplicateColumn, got {other:?}"),
    }
    assert_eq!(base.column_count(), 0);
}

#[test]
fn test_malformed_cell_in_family_row() {
    let mutation = family().to_schema_mutation(1);
    let mut row = mutation.family_row().unwrap().clone();
    row.set_bytes("gc_grace_seconds", vec![0, 1], 1);

    let err = CfMetaData::from_family_row(&row, TypeRegistry::global()).unwrap_err();
    assert!(matches!(err, SchemaError::MalformedValue(_)));
    assert!(err.source().is_some());
}

#[test]
fn test_missing_required_field() {
    let mutation = family().to_schema_mutation(1);
    let mut row = mutation.family_row().unwrap().clone();
    row.delete_cell("key_validator", 2);
    match CfMetaData::from_family_row(&row, TypeRegistry::global()) {
        Err(SchemaError::MissingField { table, field }) => {
            assert_eq!(table, "schema_columnfamilies");
            assert_eq!(field, "key_validator");
        }
        other => panic!("Expected MissingField, got {other:?}"),
    }
}

#[test]
fn test_filtering_is_not_an_error() {
    let rpc = family().to_rpc();
    assert_eq!(rpc.column_metadata.len(), 1);
}

#[test]
fn test_error_display() {
    let err = SchemaError::UnknownType("FancyType".to_string());
    assert!(err.to_string().contains("FancyType"));

    let err: SchemaError = MarshalError::new("Invalid byte for ascii: -61").into();
    assert!(err.to_string().contains("ascii"));

    let err = SchemaError::DuplicateColumn {
        keyspace: "ks".to_string(),
        table: "cf".to_string(),
        column: "c".to_string(),
    };
    assert!(err.to_string().contains("ks.cf"));
    assert!(err.source().is_none());
}
