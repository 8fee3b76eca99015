//! Delta codec laws.

use pack_decode::delta::{apply_delta, encode_copy, encode_insert, read_varint, write_varint};
use proptest::prelude::*;

proptest! {
    #[test]
    fn varint_roundtrip(value in 0usize..=u32::MAX as usize) {
        let encoded = write_varint(value);
        prop_assert_eq!(read_varint(&encoded), Some((value, encoded.len())));
    }

    #[test]
    fn insert_only_delta_reproduces_data(data in proptest::collection::vec(any::<u8>(), 0..600)) {
        let mut delta = write_varint(0);
        delta.extend_from_slice(&write_varint(data.len()));
        delta.extend_from_slice(&encode_insert(&data));
        prop_assert_eq!(apply_delta(b"", &delta).unwrap(), data);
    }

    #[test]
    fn copy_only_delta_reproduces_base(base in proptest::collection::vec(any::<u8>(), 1..600)) {
        let mut delta = write_varint(base.len());
        delta.extend_from_slice(&write_varint(base.len()));
        delta.extend_from_slice(&encode_copy(0, base.len()));
        prop_assert_eq!(apply_delta(&base, &delta).unwrap(), base);
    }

    #[test]
    fn truncated_delta_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        // Arbitrary bytes either apply cleanly or error; no panic.
        let _ = apply_delta(b"some base bytes", &data);
    }
}
