use std::cmp::Ordering;

use manifold_schema::{AbstractType, CellValue, SchemaError, TypeRegistry};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

fn random_value(ty: AbstractType, rng: &mut StdRng) -> CellValue {
    match ty {
        AbstractType::Bytes => {
            let len = rng.random_range(0..32);
            CellValue::Bytes((0..len).map(|_| rng.random::<u8>()).collect())
        }
        AbstractType::Ascii => {
            let len = rng.random_range(0..32);
            CellValue::Text((0..len).map(|_| char::from(rng.random_range(0u8..0x80))).collect())
        }
        AbstractType::Utf8 => {
            let len = rng.random_range(0..16);
            CellValue::Text((0..len).map(|_| rng.random::<char>()).collect())
        }
        AbstractType::Int32 => CellValue::Int32(rng.random()),
        AbstractType::Long => CellValue::Long(rng.random()),
        AbstractType::Boolean => CellValue::Boolean(rng.random()),
        AbstractType::Double => CellValue::Double(rng.random_range(-1.0e12..1.0e12)),
        AbstractType::Uuid => CellValue::Uuid(Uuid::from_bytes(rng.random())),
        AbstractType::Timestamp => CellValue::Timestamp(rng.random_range(-1i64 << 40..1i64 << 40)),
    }
}

#[test]
fn test_every_type_round_trips_random_values() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for ty in AbstractType::ALL {
        for _ in 0..200 {
            let value = random_value(ty, &mut rng);
            let bytes = ty.decompose(&value).unwrap();
            assert!(ty.validate(&bytes).is_ok(), "{ty} rejected its own payload");
            assert_eq!(ty.compose(&bytes).unwrap(), value, "{ty} round trip");
            assert_eq!(ty.compare(&bytes, &bytes), Ordering::Equal);
        }
    }
}

#[test]
fn test_ascii_compare_is_bytewise() {
    let ascii = AbstractType::Ascii;
    assert_eq!(ascii.compare(b"ab", b"b"), Ordering::Less);
    assert_eq!(ascii.compare(b"b", b"ab"), Ordering::Greater);
    assert_eq!(ascii.compare(b"a", b"a"), Ordering::Equal);
}

#[test]
fn test_bytewise_compare_matches_unsigned_order() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let left: Vec<u8> = (0..rng.random_range(1..8)).map(|_| rng.random()).collect();
        let right: Vec<u8> = (0..rng.random_range(1..8)).map(|_| rng.random()).collect();
        for ty in [AbstractType::Bytes, AbstractType::Utf8] {
            assert_eq!(ty.compare(&left, &right), left.cmp(&right));
        }
    }
}

#[test]
fn test_numeric_compare_matches_value_order() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let (a, b): (i64, i64) = (rng.random(), rng.random());
        let (ea, eb) = (a.to_be_bytes(), b.to_be_bytes());
        assert_eq!(AbstractType::Long.compare(&ea, &eb), a.cmp(&b));
        assert_eq!(AbstractType::Timestamp.compare(&ea, &eb), a.cmp(&b));

        let (x, y) = (a as i32, b as i32);
        assert_eq!(
            AbstractType::Int32.compare(&x.to_be_bytes(), &y.to_be_bytes()),
            x.cmp(&y)
        );

        let (f, g) = (a as f64 / 3.0, b as f64 / 7.0);
        assert_eq!(
            AbstractType::Double.compare(&f.to_be_bytes(), &g.to_be_bytes()),
            f.total_cmp(&g)
        );
    }
}

#[test]
fn test_empty_payload_sorts_first() {
    for ty in AbstractType::ALL {
        let value = ty.from_string(match ty {
            AbstractType::Bytes => "00",
            AbstractType::Boolean => "false",
            AbstractType::Uuid => "00000000-0000-0000-0000-000000000000",
            _ => "0",
        });
        let value = value.unwrap();
        assert_eq!(ty.compare(&[], &value), Ordering::Less, "{ty}");
        assert_eq!(ty.compare(&value, &[]), Ordering::Greater, "{ty}");
        assert!(ty.validate(&[]).is_ok());
    }
}

#[test]
fn test_time_uuids_order_by_timestamp() {
    // Version 1 UUIDs whose time_low alone would order them the other way.
    let earlier = Uuid::parse_str("ffffffff-0000-1000-8000-000000000000").unwrap();
    let later = Uuid::parse_str("00000000-0001-1000-8000-000000000000").unwrap();
    assert_eq!(
        AbstractType::Uuid.compare(earlier.as_bytes(), later.as_bytes()),
        Ordering::Less
    );
}

#[test]
fn test_literals_round_trip_through_get_string() {
    let cases = [
        (AbstractType::Ascii, "plain text"),
        (AbstractType::Utf8, "caf\u{e9}"),
        (AbstractType::Int32, "-42"),
        (AbstractType::Long, "9000000000"),
        (AbstractType::Boolean, "true"),
        (AbstractType::Double, "1.5"),
        (AbstractType::Uuid, "550e8400-e29b-41d4-a716-446655440000"),
        (AbstractType::Bytes, "cafe"),
        (AbstractType::Timestamp, "2011-02-03T04:05:00.000Z"),
    ];
    for (ty, literal) in cases {
        let bytes = ty.from_string(literal).unwrap();
        assert_eq!(ty.get_string(&bytes).unwrap(), literal, "{ty}");
    }
}

#[test]
fn test_timestamp_literal_forms_agree() {
    let ts = AbstractType::Timestamp;
    let expected = ts.from_string("1296705900000").unwrap();
    for literal in [
        "2011-02-03 04:05:00+0000",
        "2011-02-03T04:05:00+0000",
        "2011-02-03T04:05:00Z",
        "2011-02-03 04:05",
    ] {
        assert_eq!(ts.from_string(literal).unwrap(), expected, "{literal}");
    }
    assert!(ts.from_string("yesterday").is_err());
}

#[test]
fn test_malformed_payloads_are_rejected() {
    assert!(AbstractType::Ascii.validate(&[0x80]).is_err());
    assert!(AbstractType::Utf8.validate(&[0xC3]).is_err());
    assert!(AbstractType::Int32.compose(&[1, 2]).is_err());
    assert!(AbstractType::Uuid.validate(&[0; 8]).is_err());
    assert!(AbstractType::Int32.from_string("forty-two").is_err());
    assert!(AbstractType::Ascii.from_string("caf\u{e9}").is_err());
}

#[test]
fn test_boolean_accepts_only_zero_and_one() {
    let boolean = AbstractType::Boolean;
    assert_eq!(boolean.compose(&[0]).unwrap(), CellValue::Boolean(false));
    assert_eq!(boolean.compose(&[1]).unwrap(), CellValue::Boolean(true));
    for byte in [2u8, 0x7F, 0xFF] {
        assert!(boolean.validate(&[byte]).is_err());
        assert!(boolean.compose(&[byte]).is_err());
    }
    assert_eq!(boolean.compare(&[0], &[1]), Ordering::Less);
}

#[test]
fn test_cql3_types() {
    assert_eq!(AbstractType::Ascii.as_cql3_type().name(), "ascii");
    assert_eq!(AbstractType::Utf8.as_cql3_type().name(), "text");
    assert_eq!(AbstractType::Long.as_cql3_type().name(), "bigint");
}

#[test]
fn test_registry_resolves_both_name_forms() {
    let registry = TypeRegistry::global();
    for ty in AbstractType::ALL {
        assert_eq!(registry.resolve(&ty.class_name()).unwrap(), ty);
        assert_eq!(registry.resolve(ty.short_name()).unwrap(), ty);
    }
    assert!(matches!(
        registry.resolve("org.apache.cassandra.db.marshal.NoSuchType"),
        Err(SchemaError::UnknownType(_))
    ));
}

#[test]
fn test_custom_registry_binding() {
    let mut registry = TypeRegistry::new();
    assert!(registry.is_empty());
    registry.register("com.example.LegacyText", AbstractType::Utf8);
    assert_eq!(registry.resolve("com.example.LegacyText").unwrap(), AbstractType::Utf8);
    assert!(registry.resolve("UTF8Type").is_err());
}
