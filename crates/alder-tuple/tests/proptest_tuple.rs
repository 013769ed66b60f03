//! Property-based tests for the tuple codec.
//!
//! Invariants covered:
//! - round trip: `unpack(pack(t)) == t` under similar-value equality
//! - order preservation: packed bytes compare exactly like the tuples
//!   themselves under an independently-written model ordering
//! - the lazy view agrees with eager decoding element by element

use std::cmp::Ordering;

use proptest::prelude::*;

use alder_tuple::Element;
use alder_tuple::SlicedTuple;
use alder_tuple::Tuple;

// =============================================================================
// Generators
// =============================================================================

/// Integers biased toward encoding-width boundaries.
fn interesting_int() -> impl Strategy<Value = i64> {
    prop_oneof![
        any::<i64>(),
        prop_oneof![
            Just(0i64),
            Just(1),
            Just(-1),
            Just(255),
            Just(-255),
            Just(256),
            Just(-256),
            Just(i64::from(i32::MAX)),
            Just(i64::from(i32::MIN)),
            Just(i64::MAX),
            Just(i64::MIN),
        ],
        (-0x1_0000i64..0x1_0000),
    ]
}

fn element() -> impl Strategy<Value = Element> {
    prop_oneof![
        Just(Element::Nil),
        proptest::collection::vec(any::<u8>(), 0..24).prop_map(Element::from),
        "[a-z0-9 ]{0,16}".prop_map(|s| Element::from(s.as_str())),
        "\\PC{0,8}".prop_map(|s| Element::from(s.as_str())),
        interesting_int().prop_map(Element::Int),
        any::<bool>().prop_map(Element::Bool),
    ]
}

fn tuple() -> impl Strategy<Value = Tuple> {
    proptest::collection::vec(element(), 0..6).prop_map(|elements| elements.into_iter().collect())
}

// =============================================================================
// Model ordering
// =============================================================================

/// Rank of an element kind in the wire format's cross-type order.
fn kind_rank(e: &Element) -> u8 {
    match e {
        Element::Nil => 0,
        Element::Bytes(_) => 1,
        Element::Str(_) => 2,
        Element::Int(_) | Element::Bool(_) => 3,
    }
}

/// Element order written against the data model rather than the encoding:
/// kinds in tag order, then bytes/strings lexicographically, then integers
/// numerically.
fn model_element_cmp(a: &Element, b: &Element) -> Ordering {
    kind_rank(a).cmp(&kind_rank(b)).then_with(|| match (a, b) {
        (Element::Bytes(x), Element::Bytes(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Element::Str(x), Element::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
        _ => model_int(a).cmp(&model_int(b)),
    })
}

fn model_int(e: &Element) -> i64 {
    match e {
        Element::Int(n) => *n,
        Element::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn model_tuple_cmp(a: &Tuple, b: &Tuple) -> Ordering {
    let mut ia = a.iter();
    let mut ib = b.iter();
    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match model_element_cmp(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn pack_unpack_roundtrip(t in tuple()) {
        let packed = t.pack();
        let back = Tuple::unpack(&packed).unwrap();
        prop_assert_eq!(back, t);
    }

    #[test]
    fn packing_preserves_order(a in tuple(), b in tuple()) {
        let byte_order = a.pack().cmp(&b.pack());
        let model_order = model_tuple_cmp(&a, &b);

        // A tuple that is a strict prefix of another packs to a strict
        // byte prefix, and the wire format sorts extensions after the
        // prefix, matching the model's shorter-first rule.
        prop_assert_eq!(byte_order, model_order);
    }

    #[test]
    fn lazy_view_agrees_with_eager_decode(t in tuple()) {
        let view = SlicedTuple::from_tuple(&t);
        prop_assert_eq!(view.len().unwrap(), t.len());
        for i in 0..t.len() {
            prop_assert_eq!(&view.get(i as isize).unwrap(), t.get(i).unwrap());
        }
        prop_assert_eq!(view.decode().unwrap(), t);
    }

    #[test]
    fn raw_windows_partition_the_encoding(t in tuple()) {
        let view = SlicedTuple::from_tuple(&t);
        let mut rebuilt = Vec::new();
        for i in 0..view.len().unwrap() {
            rebuilt.extend_from_slice(view.raw(i as isize).unwrap().as_bytes());
        }
        prop_assert_eq!(rebuilt, t.pack().to_vec());
    }

    #[test]
    fn append_matches_push(t in tuple(), e in element()) {
        let eager = t.append(e.clone());
        let lazy = SlicedTuple::from_tuple(&t).append(e);
        prop_assert_eq!(lazy.decode().unwrap(), eager);
    }
}
