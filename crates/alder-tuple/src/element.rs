//! Tuple element values and conversions.

use std::cmp::Ordering;
use std::hash::Hash;
use std::hash::Hasher;

use alder_slice::Slice;

use crate::codec;
use crate::error::TupleError;

/// A single element of a tuple.
///
/// Elements compare with a "similar value" equality: integers compare
/// numerically regardless of the width they were pushed with, and booleans
/// are equal to the integers 0 and 1 they encode as. Strings compare
/// ordinally. The `Ord` impl matches the lexicographic order of the packed
/// bytes, which is the order keys take in the database.
#[derive(Debug, Clone)]
pub enum Element {
    /// The nil element (sorts first).
    Nil,

    /// Byte string.
    Bytes(Slice),

    /// UTF-8 string.
    Str(String),

    /// Signed 64-bit integer.
    Int(i64),

    /// Boolean; encodes as the integer 0 or 1.
    Bool(bool),
}

impl Element {
    /// Short name of the element kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Nil => "nil",
            Element::Bytes(_) => "bytes",
            Element::Str(_) => "string",
            Element::Int(_) => "integer",
            Element::Bool(_) => "boolean",
        }
    }

    /// Numeric view shared by `Int` and `Bool`.
    fn as_int(&self) -> Option<i64> {
        match self {
            Element::Int(n) => Some(*n),
            Element::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Append this element's encoding to a raw buffer.
    pub(crate) fn pack_into(&self, buf: &mut Vec<u8>) {
        match self {
            Element::Nil => buf.push(codec::NIL_TAG),
            Element::Bytes(bytes) => {
                buf.push(codec::BYTES_TAG);
                codec::encode_escaped(bytes.as_bytes(), buf);
                buf.push(0x00);
            }
            Element::Str(s) => {
                buf.push(codec::STRING_TAG);
                codec::encode_escaped(s.as_bytes(), buf);
                buf.push(0x00);
            }
            Element::Int(n) => codec::encode_int(*n, buf),
            Element::Bool(b) => codec::encode_int(i64::from(*b), buf),
        }
    }

    /// This element's encoding on its own.
    pub fn pack(&self) -> Slice {
        let mut buf = Vec::new();
        self.pack_into(&mut buf);
        Slice::from_vec(buf)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Element::Nil, Element::Nil) => true,
            (Element::Bytes(a), Element::Bytes(b)) => a == b,
            (Element::Str(a), Element::Str(b)) => a == b,
            // Int/Bool compare numerically across the two kinds.
            _ => match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Element::Nil => state.write_u8(0),
            Element::Bytes(bytes) => {
                state.write_u8(1);
                bytes.hash(state);
            }
            Element::Str(s) => {
                state.write_u8(2);
                s.hash(state);
            }
            // Bool hashes as the integer it equals.
            Element::Int(_) | Element::Bool(_) => {
                state.write_u8(3);
                state.write_i64(self.as_int().unwrap_or(0));
            }
        }
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        // Packed bytes carry the key order by construction.
        self.pack().cmp(&other.pack())
    }
}

// =============================================================================
// Input Conversions
// =============================================================================

impl From<()> for Element {
    fn from(_: ()) -> Self {
        Element::Nil
    }
}

impl From<Slice> for Element {
    fn from(s: Slice) -> Self {
        Element::Bytes(s)
    }
}

impl From<Vec<u8>> for Element {
    fn from(v: Vec<u8>) -> Self {
        Element::Bytes(Slice::from_vec(v))
    }
}

impl From<&[u8]> for Element {
    fn from(v: &[u8]) -> Self {
        Element::Bytes(Slice::copy_from(v))
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Element::Str(s)
    }
}

impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::Str(s.to_owned())
    }
}

impl From<i64> for Element {
    fn from(n: i64) -> Self {
        Element::Int(n)
    }
}

impl From<i32> for Element {
    fn from(n: i32) -> Self {
        Element::Int(i64::from(n))
    }
}

impl From<u32> for Element {
    fn from(n: u32) -> Self {
        Element::Int(i64::from(n))
    }
}

impl From<bool> for Element {
    fn from(b: bool) -> Self {
        Element::Bool(b)
    }
}

// =============================================================================
// Output Conversions
// =============================================================================

/// Conversion from a decoded element into a concrete Rust type.
///
/// This is the coercion step behind the typed tuple accessors: numeric
/// targets accept any integer element that fits, booleans accept 0 and 1,
/// and everything else requires the matching element kind.
pub trait TryFromElement: Sized {
    /// Convert, or explain why the element does not fit.
    fn try_from_element(element: Element) -> Result<Self, TupleError>;
}

impl TryFromElement for Element {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        Ok(element)
    }
}

impl TryFromElement for i64 {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        element.as_int().ok_or(TupleError::TypeMismatch {
            expected: "integer",
            actual: element.kind(),
        })
    }
}

impl TryFromElement for i32 {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        let n = i64::try_from_element(element)?;
        i32::try_from(n).map_err(|_| TupleError::TypeMismatch {
            expected: "32-bit integer",
            actual: "integer",
        })
    }
}

impl TryFromElement for u32 {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        let n = i64::try_from_element(element)?;
        u32::try_from(n).map_err(|_| TupleError::TypeMismatch {
            expected: "unsigned 32-bit integer",
            actual: "integer",
        })
    }
}

impl TryFromElement for u64 {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        let n = i64::try_from_element(element)?;
        u64::try_from(n).map_err(|_| TupleError::TypeMismatch {
            expected: "unsigned integer",
            actual: "integer",
        })
    }
}

impl TryFromElement for bool {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        match element.as_int() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(TupleError::TypeMismatch {
                expected: "boolean",
                actual: element.kind(),
            }),
        }
    }
}

impl TryFromElement for String {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        match element {
            Element::Str(s) => Ok(s),
            other => Err(TupleError::TypeMismatch {
                expected: "string",
                actual: other.kind(),
            }),
        }
    }
}

impl TryFromElement for Slice {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        match element {
            Element::Bytes(s) => Ok(s),
            other => Err(TupleError::TypeMismatch {
                expected: "bytes",
                actual: other.kind(),
            }),
        }
    }
}

impl TryFromElement for Vec<u8> {
    fn try_from_element(element: Element) -> Result<Self, TupleError> {
        Slice::try_from_element(element).map(|s| s.to_vec())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_value_equality_spans_bool_and_int() {
        assert_eq!(Element::Bool(false), Element::Int(0));
        assert_eq!(Element::Bool(true), Element::Int(1));
        assert_ne!(Element::Bool(true), Element::Int(2));
        assert_ne!(Element::Int(0), Element::Nil);
        assert_eq!(Element::from(123i32), Element::from(123i64));
    }

    #[test]
    fn hash_is_consistent_with_equality() {
        fn hash_of(e: &Element) -> u64 {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            e.hash(&mut h);
            h.finish()
        }

        assert_eq!(hash_of(&Element::Bool(true)), hash_of(&Element::Int(1)));
        assert_eq!(hash_of(&Element::from("x")), hash_of(&Element::Str("x".to_owned())));
    }

    #[test]
    fn elements_order_like_their_encodings() {
        // Nil < bytes < strings < all integers.
        let ordered = [
            Element::Nil,
            Element::from(vec![0xFFu8]),
            Element::from("zzz"),
            Element::Int(i64::MIN),
            Element::Int(-1),
            Element::Int(0),
            Element::Int(i64::MAX),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should sort before {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn int_coercions_check_range() {
        assert_eq!(i32::try_from_element(Element::Int(123)).unwrap(), 123);
        assert!(matches!(
            i32::try_from_element(Element::Int(i64::MAX)),
            Err(TupleError::TypeMismatch { .. })
        ));
        assert_eq!(u64::try_from_element(Element::Int(7)).unwrap(), 7);
        assert!(matches!(
            u32::try_from_element(Element::Int(-1)),
            Err(TupleError::TypeMismatch { .. })
        ));
        assert_eq!(i64::try_from_element(Element::Bool(true)).unwrap(), 1);
    }

    #[test]
    fn kind_mismatches_are_reported() {
        assert!(matches!(
            String::try_from_element(Element::Int(1)),
            Err(TupleError::TypeMismatch {
                expected: "string",
                actual: "integer"
            })
        ));
        assert!(matches!(
            Slice::try_from_element(Element::from("text")),
            Err(TupleError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn bool_coercion_accepts_zero_and_one_only() {
        assert!(!bool::try_from_element(Element::Int(0)).unwrap());
        assert!(bool::try_from_element(Element::Int(1)).unwrap());
        assert!(bool::try_from_element(Element::Bool(true)).unwrap());
        assert!(matches!(
            bool::try_from_element(Element::Int(2)),
            Err(TupleError::TypeMismatch { .. })
        ));
    }
}
