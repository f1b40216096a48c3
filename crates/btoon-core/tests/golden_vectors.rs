//! Literal input -> expected byte vector scenarios, reproduced end to end
//! through the public `encode`/`decode` entry points.

use btoon_core::{decode, encode, DecodeOptions, EncodeOptions, Value};

#[test]
fn scenario_1_nil() {
    assert_eq!(encode(&Value::Nil, &EncodeOptions::default()).unwrap(), vec![0xc0]);
}

#[test]
fn scenario_2_small_positive_int() {
    let bytes = encode(&Value::UnsignedInt(42), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0x2a]);
}

#[test]
fn scenario_3_small_negative_int() {
    let bytes = encode(&Value::SignedInt(-12), &EncodeOptions::default()).unwrap();
    assert_eq!(bytes, vec![0xf4]);
}

#[test]
fn scenario_4_short_ascii_string() {
    let bytes = encode(
        &Value::String("Hello, BTOON!".to_string()),
        &EncodeOptions::default(),
    )
    .unwrap();
    let expected = hex::decode("ad48656c6c6f2c2042544f4f4e21").unwrap();
    assert_eq!(bytes, expected);
}

#[test]
fn scenario_5_homogeneous_small_array() {
    let value = Value::Array(vec![
        Value::UnsignedInt(1),
        Value::UnsignedInt(2),
        Value::UnsignedInt(3),
    ]);
    let options = EncodeOptions::default().with_auto_tabular(false);
    let bytes = encode(&value, &options).unwrap();
    assert_eq!(bytes, vec![0x93, 0x01, 0x02, 0x03]);
}

#[test]
fn scenario_6_two_field_map() {
    let value = Value::Map(vec![
        ("name".to_string(), Value::String("Alice".to_string())),
        ("age".to_string(), Value::UnsignedInt(30)),
    ]);
    let bytes = encode(&value, &EncodeOptions::default()).unwrap();
    let expected = hex::decode("82a46e616d65a5416c696365a36167651e").unwrap();
    assert_eq!(bytes, expected);
}

#[test]
fn scenario_7_tabular_round_trip() {
    let value = Value::Array(vec![
        Value::Map(vec![
            ("a".to_string(), Value::UnsignedInt(1)),
            ("b".to_string(), Value::String("x".to_string())),
        ]),
        Value::Map(vec![
            ("a".to_string(), Value::UnsignedInt(2)),
            ("b".to_string(), Value::String("y".to_string())),
        ]),
    ]);
    let options = EncodeOptions::default().with_auto_tabular(true);
    let bytes = encode(&value, &options).unwrap();

    assert!(bytes[0] == 0xc7 || bytes[0] == 0xd8, "got marker {:#x}", bytes[0]);
    // The tabular extension's type tag, -10 in two's complement, must appear
    // immediately before the body regardless of which ext marker was chosen.
    assert!(bytes.contains(&0xf6));

    let decoded = decode(&bytes, &DecodeOptions::default()).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn scenario_7_non_tabular_array_never_emits_ext_minus_ten() {
    let value = Value::Array(vec![
        Value::Map(vec![("a".to_string(), Value::UnsignedInt(1))]),
        Value::UnsignedInt(2),
    ]);
    let bytes = encode(&value, &EncodeOptions::default().with_auto_tabular(true)).unwrap();
    assert_ne!(bytes[0], 0xc7);
    assert_ne!(bytes[0], 0xd8);
}

#[test]
fn scenario_8_compression_frame() {
    let value = Value::Map(vec![("data".to_string(), Value::String("A".repeat(10 * 1024)))]);
    let options = EncodeOptions::default()
        .with_compress(true)
        .with_algorithm(btoon_core::Algorithm::Zlib)
        .with_min_compression_size(0);
    let bytes = encode(&value, &options).unwrap();

    assert_eq!(&bytes[0..4], b"BTON");
    assert_eq!(bytes[4], 1);
    assert_eq!(bytes[5], 0);

    let decoded = decode(&bytes, &DecodeOptions::default().with_auto_decompress(true)).unwrap();
    assert_eq!(decoded, value);
}
