//! Property-based tests for slice round-trips and ordering.
//!
//! Invariants covered:
//! - `unescape(escape(b)) == b`, `from_hex(to_hex(b)) == b`,
//!   `from_base64(to_base64(b)) == b` for every byte string `b`
//! - slice ordering agrees with lexicographic unsigned-byte comparison and
//!   is antisymmetric
//! - equality implies hash equality

use proptest::prelude::*;

use alder_slice::Slice;

fn byte_string() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

proptest! {
    #[test]
    fn escape_roundtrip(bytes in byte_string()) {
        let s = Slice::from_vec(bytes);
        prop_assert_eq!(Slice::unescape(&s.escape()).unwrap(), s);
    }

    #[test]
    fn hex_roundtrip(bytes in byte_string()) {
        let s = Slice::from_vec(bytes);
        let hex = s.to_hex();
        prop_assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert_eq!(Slice::from_hex(&hex).unwrap(), s);
    }

    #[test]
    fn base64_roundtrip(bytes in byte_string()) {
        let s = Slice::from_vec(bytes);
        prop_assert_eq!(Slice::from_base64(&s.to_base64()).unwrap(), s);
    }

    #[test]
    fn ordering_matches_byte_order(a in byte_string(), b in byte_string()) {
        let sa = Slice::from_vec(a.clone());
        let sb = Slice::from_vec(b.clone());
        prop_assert_eq!(sa.cmp(&sb), a.cmp(&b));
        prop_assert_eq!(sa.cmp(&sb), sb.cmp(&sa).reverse());
    }

    #[test]
    fn equality_implies_hash_equality(bytes in byte_string()) {
        let a = Slice::from_vec(bytes.clone());
        let b = Slice::copy_from(&bytes);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.fnv32(), b.fnv32());
    }

    #[test]
    fn negative_indexing_counts_from_end(bytes in proptest::collection::vec(any::<u8>(), 1..64)) {
        let s = Slice::from_vec(bytes.clone());
        let len = bytes.len();
        for k in 1..=len {
            prop_assert_eq!(s.at(-(k as isize)).unwrap(), bytes[len - k]);
        }
    }
}
