use std::collections::BTreeMap;

use manifold_schema::{
    AbstractType, CfMetaData, ColumnDefinition, ColumnFamilyType, CompressionParameters,
    IndexType, RpcColumnDef, RpcDefinition, SchemaCache, SchemaTable, TypeRegistry, load_schema,
};
use uuid::Uuid;

const KEYSPACE: &str = "Keyspace1";
const COLUMN_FAMILY: &str = "Standard1";

fn column_defs() -> Vec<RpcColumnDef> {
    vec![
        RpcColumnDef::new("col1", AbstractType::Ascii.class_name())
            .with_index_name("col1Index")
            .with_index_type(IndexType::Keys),
        RpcColumnDef::new("col2", AbstractType::Utf8.class_name())
            .with_index_name("col2Index")
            .with_index_type(IndexType::Keys),
    ]
}

/// Families covering every column kind, a few comparators and non-default options.
fn fixtures() -> Vec<CfMetaData> {
    let mut custom_options = BTreeMap::new();
    custom_options.insert("class_name".to_string(), "org.example.TextIndex".to_string());

    vec![
        CfMetaData::builder(KEYSPACE, COLUMN_FAMILY).build().unwrap(),
        CfMetaData::builder(KEYSPACE, "Indexed1")
            .key_validator(AbstractType::Utf8)
            .column(ColumnDefinition::regular("birthdate", AbstractType::Long).with_index(
                "birthdate_key_index",
                IndexType::Keys,
                BTreeMap::new(),
            ))
            .build()
            .unwrap(),
        CfMetaData::builder(KEYSPACE, "Super1")
            .cf_type(ColumnFamilyType::Super)
            .comparator(AbstractType::Long)
            .default_validator(AbstractType::Utf8)
            .comment("super")
            .build()
            .unwrap(),
        CfMetaData::builder("Keyspace2", "Composite1")
            .comparator(AbstractType::Utf8)
            .key_validator(AbstractType::Uuid)
            .column(ColumnDefinition::partition_key("id", AbstractType::Uuid, None))
            .column(ColumnDefinition::clustering_key("at", AbstractType::Timestamp, Some(0)))
            .column(ColumnDefinition::clustering_key("seq", AbstractType::Int32, Some(1)))
            .column(ColumnDefinition::static_column("owner", AbstractType::Utf8))
            .column(ColumnDefinition::regular("body", AbstractType::Utf8).with_index(
                "body_index",
                IndexType::Custom,
                custom_options,
            ))
            .column(
                ColumnDefinition::regular("score", AbstractType::Double)
                    .with_component_index(Some(2)),
            )
            .gc_grace_seconds(3600)
            .default_time_to_live(86400)
            .read_repair_chance(0.25)
            .compaction_thresholds(2, 8)
            .generation(17)
            .build()
            .unwrap(),
        CfMetaData::builder("Keyspace2", "Uncompressed1")
            .compression(CompressionParameters::disabled())
            .column(ColumnDefinition::regular("flag", AbstractType::Boolean))
            .build()
            .unwrap(),
    ]
}

fn check_inverses(cfm: &CfMetaData) {
    let registry = TypeRegistry::global();

    let before = cfm.rpc_compatible();
    let after = CfMetaData::from_rpc(&before.to_rpc(), registry)
        .unwrap()
        .rpc_compatible();
    assert_eq!(before, after);

    let mutation = cfm.to_schema_mutation(1_386_000_000_000);
    let family_row = mutation.family_row().unwrap();
    let restored = CfMetaData::from_family_row(family_row, registry)
        .unwrap()
        .merge_column_rows(mutation.column_rows(), registry)
        .unwrap();
    assert_eq!(&restored, cfm);
}

#[test]
fn test_rpc_conversion() {
    let def = RpcDefinition {
        default_validation_class: Some(AbstractType::Ascii.class_name()),
        comment: Some("Test comment".to_string()),
        column_metadata: column_defs(),
        ..RpcDefinition::new(KEYSPACE, COLUMN_FAMILY)
    };

    let cfm = CfMetaData::from_rpc(&def, TypeRegistry::global()).unwrap();
    let converted = cfm.to_rpc();

    assert_eq!(converted.keyspace, KEYSPACE);
    assert_eq!(converted.name, COLUMN_FAMILY);
    assert_eq!(converted.default_validation_class, def.default_validation_class);
    assert_eq!(converted.comment, def.comment);
    assert_eq!(converted.column_metadata, column_defs());
}

#[test]
fn test_conversions_inverses() {
    for cfm in fixtures() {
        check_inverses(&cfm);

        let with_compression = cfm.rename(cfm.cf_name()).with_compression(
            CompressionParameters::new("SnappyCompressor", Some(32768), BTreeMap::new()).unwrap(),
        );
        check_inverses(&with_compression);
    }
}

#[test]
fn test_compression_edge_cases_survive_both_adapters() {
    let mut extra = BTreeMap::new();
    extra.insert("crc_check_chance".to_string(), "0.25".to_string());
    let variants = [
        CompressionParameters::new("SnappyCompressor", Some(1024), BTreeMap::new()).unwrap(),
        CompressionParameters::new("DeflateCompressor", Some(1 << 20), extra).unwrap(),
        CompressionParameters::disabled(),
    ];
    let base = fixtures().remove(1);
    for compression in variants {
        check_inverses(&base.with_compression(compression));
    }

    // Shapes the option map cannot carry exactly are refused up front.
    assert!(CompressionParameters::new("SnappyCompressor", Some(1500), BTreeMap::new()).is_err());
    assert!(CompressionParameters::new("", None, BTreeMap::new()).is_err());
    let mut reserved = BTreeMap::new();
    reserved.insert("chunk_length_kb".to_string(), "8".to_string());
    assert!(CompressionParameters::new("SnappyCompressor", None, reserved).is_err());
}

#[test]
fn test_rpc_drops_only_incompatible_columns() {
    let families = fixtures();
    let composite = &families[3];
    let rpc = composite.to_rpc();
    let names: Vec<_> = rpc.column_metadata.iter().map(|c| c.name.as_slice()).collect();
    assert_eq!(names, vec![&b"body"[..]]);

    let back = CfMetaData::from_rpc(&rpc, TypeRegistry::global()).unwrap();
    assert_eq!(back.column_count(), 1);
    assert_eq!(back.generation(), composite.generation());
    assert_eq!(back.cf_id(), composite.cf_id());
}

#[test]
fn test_schema_rows_keep_every_column() {
    let families = fixtures();
    let composite = &families[3];
    let mutation = composite.to_schema_mutation(5);
    assert_eq!(mutation.column_rows().len(), composite.column_count());
    assert_eq!(mutation.upserts(SchemaTable::ColumnFamilies).count(), 1);
}

#[test]
fn test_compression_does_not_touch_comparator() {
    let families = fixtures();
    let cfm = &families[2];
    let compressed = cfm.with_compression(
        CompressionParameters::new("DeflateCompressor", None, BTreeMap::new()).unwrap(),
    );
    assert_eq!(compressed.comparator(), cfm.comparator());
    assert_ne!(&compressed, cfm);

    let rpc = compressed.to_rpc();
    assert_eq!(rpc.comparator_type, Some(AbstractType::Long.class_name()));
    let options = rpc.compression_options.unwrap();
    assert_eq!(options["sstable_compression"], "DeflateCompressor");
}

#[test]
fn test_load_schema_and_publish() {
    let families = fixtures();
    let mut family_rows = Vec::new();
    let mut column_rows = Vec::new();
    for cfm in &families {
        let mutation = cfm.to_schema_mutation(99);
        family_rows.extend(mutation.family_row().cloned());
        column_rows.extend(mutation.column_rows().into_iter().cloned());
    }

    let loaded = load_schema(&family_rows, &column_rows, TypeRegistry::global()).unwrap();
    assert_eq!(loaded, families);

    let cache = SchemaCache::new();
    for cfm in loaded {
        cache.publish(cfm);
    }
    assert_eq!(cache.len(), families.len());
    assert_eq!(cache.families(KEYSPACE).len(), 3);
    assert_eq!(
        cache.get("Keyspace2", "Composite1").unwrap().as_ref(),
        &families[3]
    );
}

#[test]
fn test_schema_update_round_trip() {
    let old = fixtures().remove(3);
    let new = old
        .without_column(b"owner")
        .with_column(ColumnDefinition::regular("tags", AbstractType::Utf8))
        .with_comment("altered");
    let applied = old.apply_update(&new).unwrap();
    let mutation = old.to_schema_update(&applied, 10);

    assert_eq!(mutation.deletions(SchemaTable::Columns).count(), 1);
    let restored = CfMetaData::from_schema(
        mutation.family_row().unwrap(),
        mutation.column_rows(),
        TypeRegistry::global(),
    )
    .unwrap();
    assert_eq!(restored, applied);
    assert_eq!(restored.generation(), old.generation() + 1);
}

#[test]
fn test_explicit_id_survives_both_adapters() {
    let id = Uuid::new_v4();
    let cfm = CfMetaData::builder(KEYSPACE, "Random1")
        .id(id)
        .column(ColumnDefinition::regular("v", AbstractType::Utf8))
        .build()
        .unwrap();
    assert_ne!(id, CfMetaData::default_id(KEYSPACE, "Random1"));

    let from_rpc = CfMetaData::from_rpc(&cfm.to_rpc(), TypeRegistry::global()).unwrap();
    assert_eq!(from_rpc.cf_id(), id);

    let mutation = cfm.to_schema_mutation(3);
    let from_rows = CfMetaData::from_schema(
        mutation.family_row().unwrap(),
        mutation.column_rows(),
        TypeRegistry::global(),
    )
    .unwrap();
    assert_eq!(from_rows.cf_id(), id);
    assert_eq!(from_rows.rename("Random2").cf_id(), id);
}

#[test]
fn test_fixtures_validate() {
    for cfm in fixtures() {
        cfm.validate().unwrap();
    }
}
