//! Property-based tests for the wire codec

use proptest::prelude::*;
use tagson_wire::{parse, parse_str, serialize, Bytes, Fields, Timestamp, Value};

/// Strategy for object keys, sentinel-shaped ones included so the `@obj`
/// escape gets exercised.
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_][a-z0-9_]{0,11}",
        prop::sample::select(vec![
            "@ref".to_string(),
            "@ts".to_string(),
            "@obj".to_string(),
            "plain".to_string(),
        ]),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Long),
        // NaN never compares equal; stick to finite doubles.
        (-1e15f64..1e15f64).prop_map(Value::Double),
        "[ -~]{0,24}".prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..16)
            .prop_map(|bytes| Value::Bytes(Bytes::new(bytes))),
        (-10_000_000_000i64..10_000_000_000i64, 0i64..1_000_000i64)
            .prop_map(|(millis, nanos)| Value::Timestamp(Timestamp::new(millis, nanos))),
    ];
    leaf.prop_recursive(4, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((key_strategy(), inner), 0..6).prop_map(|entries| {
                let mut fields = Fields::new();
                for (key, value) in entries {
                    fields.insert(key, value);
                }
                Value::Object(fields)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn serialize_parse_roundtrip_property(value in value_strategy()) {
        let bytes = serialize(&value).expect("serialization failed");
        let parsed = parse(&bytes).expect("parse of own output failed");
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn serialized_output_is_valid_json(value in value_strategy()) {
        let bytes = serialize(&value).expect("serialization failed");
        let parsed: Result<serde_json::Value, _> = serde_json::from_slice(&bytes);
        prop_assert!(parsed.is_ok(), "output is not plain JSON");
    }

    #[test]
    fn parse_never_panics_on_arbitrary_text(text in "[ -~]{0,64}") {
        let _ = parse_str(&text);
    }
}
