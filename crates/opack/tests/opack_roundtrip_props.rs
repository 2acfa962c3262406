use chrono::{TimeZone, Utc};
use opack::{OPack, OPackOptions, Value};
use proptest::prelude::*;

fn arb_number() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i8>().prop_map(Value::Int8),
        any::<i16>().prop_map(Value::Int16),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        any::<u8>().prop_map(Value::UInt8),
        any::<u16>().prop_map(Value::UInt16),
        any::<u32>().prop_map(Value::UInt32),
        any::<u64>().prop_map(Value::UInt64),
        (-1.0e6f32..1.0e6).prop_map(Value::Float32),
        (-1.0e12f64..1.0e12).prop_map(Value::Float64),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        arb_number(),
        "[a-z]{0,40}".prop_map(Value::String),
        "\\PC{0,8}".prop_map(Value::String),
        (-11_644_473_600i64..4_000_000_000, 0u32..10_000_000).prop_map(|(secs, ticks)| {
            Value::DateTime(Utc.timestamp_opt(secs, ticks * 100).unwrap())
        }),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 96, 10, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
            prop::collection::vec(("[a-f]{1,3}", inner), 0..10)
                .prop_map(|entries| Value::Map(entries.into_iter().collect())),
        ]
    })
}

fn option_variants() -> Vec<OPackOptions> {
    vec![
        OPackOptions::default(),
        OPackOptions::default().index_values(false),
        OPackOptions::default().write_optimized_indexed_types(false),
        OPackOptions::default()
            .max_table_split_for_key(1)
            .max_table_split_for_value(1),
    ]
}

proptest! {
    #[test]
    fn decode_inverts_encode(doc in arb_value()) {
        for options in option_variants() {
            let codec = OPack::with_options(options);
            let bytes = codec.encode(&doc).unwrap();
            prop_assert_eq!(codec.decode(&bytes).unwrap(), doc.clone());
        }
    }

    #[test]
    fn encode_is_deterministic(doc in arb_value()) {
        let codec = OPack::new();
        prop_assert_eq!(codec.encode(&doc).unwrap(), codec.encode(&doc).unwrap());
    }

    #[test]
    fn decode_never_panics_on_noise(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = OPack::new().decode(&bytes);
    }

    #[test]
    fn decode_never_panics_on_mutated_streams(
        doc in arb_value(),
        flips in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..4),
    ) {
        let codec = OPack::new();
        let mut bytes = codec.encode(&doc).unwrap();
        for (at, byte) in flips {
            let i = at.index(bytes.len());
            bytes[i] = byte;
        }
        let _ = codec.decode(&bytes);
    }
}
