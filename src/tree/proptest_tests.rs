//! Property-based tests for property tree round-trips.

use proptest::prelude::*;

use crate::tree::{Decoder, PropertyValue};

/// Strategy for generating arbitrary property trees.
fn arb_value() -> impl Strategy<Value = PropertyValue> {
    let leaf = prop_oneof![
        Just(PropertyValue::None),
        any::<bool>().prop_map(PropertyValue::Bool),
        any::<f64>().prop_map(PropertyValue::Number),
        ".*".prop_map(|s: String| PropertyValue::string(s)),
        any::<i64>().prop_map(PropertyValue::SignedLong),
        any::<u64>().prop_map(PropertyValue::UnsignedLong),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(PropertyValue::List),
            prop::collection::vec(("[a-z-]{0,12}", inner), 0..8)
                .prop_map(PropertyValue::Dictionary),
        ]
    })
}

proptest! {
    #[test]
    fn value_roundtrip(value in arb_value()) {
        let encoded = value.encode().expect("encoding should succeed");
        let decoded = Decoder::new().decode(&encoded).expect("decoding should succeed");
        prop_assert_eq!(value, decoded);
    }

    #[test]
    fn encoded_length_is_fully_consumed(value in arb_value()) {
        let encoded = value.encode().expect("encoding should succeed");
        let mut reader = crate::codec::Reader::new(&encoded);
        Decoder::new().decode_node(&mut reader).expect("decoding should succeed");
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn space_optimised_roundtrip(value in any::<u32>()) {
        let mut writer = crate::codec::Writer::new();
        writer.write_unsigned_integer(value, true);
        let expected_len = if value < 255 { 1 } else { 5 };
        prop_assert_eq!(writer.as_bytes().len(), expected_len);
        let back = crate::codec::Reader::new(writer.as_bytes())
            .read_unsigned_integer(true)
            .expect("decoding should succeed");
        prop_assert_eq!(back, value);
    }

    #[test]
    fn truncated_input_never_panics(value in arb_value(), cut in any::<prop::sample::Index>()) {
        let encoded = value.encode().expect("encoding should succeed");
        let cut = cut.index(encoded.len());
        prop_assert!(Decoder::new().decode(&encoded[..cut]).is_err());
    }
}
