//! Subspace-based namespace isolation.
//!
//! A subspace confines a layer's keys to a common prefix inside the flat
//! keyspace, so unrelated layers never collide and a single range scan
//! covers exactly one layer's state. The prefix is a packed tuple, which
//! keeps subspace ranges compatible with the tuple ordering.

use alder_slice::Slice;
use snafu::ResultExt;
use snafu::Snafu;

use crate::codec::TupleWriter;
use crate::error::CodecError;
use crate::tuple::Tuple;

/// A namespace within the keyspace, defined by a key prefix.
///
/// # Example
///
/// ```
/// use alder_tuple::Subspace;
/// use alder_tuple::Tuple;
///
/// let users = Subspace::new(&Tuple::new().push("users"));
/// let key = users.pack(&Tuple::new().push("alice").push("profile"));
///
/// assert!(users.contains(&key));
/// assert_eq!(users.unpack(&key).unwrap(), Tuple::new().push("alice").push("profile"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subspace {
    prefix: Slice,
}

impl Subspace {
    /// A subspace rooted at the packed form of `prefix`.
    pub fn new(prefix: &Tuple) -> Self {
        Self { prefix: prefix.pack() }
    }

    /// A subspace rooted at a pre-computed raw prefix.
    pub fn from_slice(prefix: Slice) -> Self {
        Self { prefix }
    }

    /// The raw key prefix.
    pub fn prefix(&self) -> &Slice {
        &self.prefix
    }

    /// A nested subspace: this prefix extended by `suffix`.
    pub fn subspace(&self, suffix: &Tuple) -> Self {
        Self {
            prefix: self.pack(suffix),
        }
    }

    /// Pack a key tuple inside this subspace: prefix followed by the
    /// tuple's encoding.
    pub fn pack(&self, key: &Tuple) -> Slice {
        let mut writer = TupleWriter::with_capacity(self.prefix.len() + key.len() * 8);
        writer.put_raw(self.prefix.as_bytes());
        key.pack_into(&mut writer);
        writer.into_slice()
    }

    /// Prefix a pre-encoded key verbatim.
    pub fn pack_slice(&self, key: &Slice) -> Slice {
        let mut writer = TupleWriter::with_capacity(self.prefix.len() + key.len());
        writer.put_raw(self.prefix.as_bytes());
        writer.put_raw(key.as_bytes());
        writer.into_slice()
    }

    /// Whether `key` lives inside this subspace.
    pub fn contains(&self, key: &Slice) -> bool {
        key.has_value() && key.as_bytes().starts_with(self.prefix.as_bytes())
    }

    /// Strip the prefix from `key` and decode the remainder as a tuple.
    pub fn unpack(&self, key: &Slice) -> Result<Tuple, SubspaceError> {
        if !self.contains(key) {
            return PrefixMismatchSnafu {
                expected_len: self.prefix.len(),
                actual_len: key.len(),
            }
            .fail();
        }
        let suffix = key
            .substring(self.prefix.len() as isize)
            .expect("contains() checked the prefix length");
        Tuple::unpack(&suffix).context(DecodeSnafu)
    }

    /// The range of every key in this subspace: `(prefix, prefix ++ 0xFF)`,
    /// begin inclusive and end exclusive.
    pub fn range(&self) -> (Slice, Slice) {
        let begin = self.prefix.clone();
        let mut end = self.prefix.to_vec();
        end.push(0xFF);
        (begin, Slice::from_vec(end))
    }

    /// The strict upper bound obtained by incrementing the last
    /// incrementable byte of the prefix. `None` when the prefix is empty or
    /// all `0xFF`.
    pub fn strinc(&self) -> Option<Slice> {
        let mut bytes = self.prefix.to_vec();
        while let Some(&last) = bytes.last() {
            if last < 0xFF {
                let end = bytes.len() - 1;
                bytes[end] = last + 1;
                return Some(Slice::from_vec(bytes));
            }
            bytes.pop();
        }
        None
    }
}

/// Errors raised by subspace key deconstruction.
#[derive(Debug, Snafu)]
pub enum SubspaceError {
    /// Key does not start with this subspace's prefix.
    #[snafu(display("key prefix mismatch: expected {expected_len} prefix bytes, key has {actual_len} bytes"))]
    PrefixMismatch {
        /// Length of the subspace prefix.
        expected_len: usize,
        /// Length of the offending key.
        actual_len: usize,
    },

    /// The suffix after the prefix is not a valid tuple.
    #[snafu(display("suffix decode error: {source}"))]
    Decode {
        /// The underlying codec error.
        source: CodecError,
    },
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_are_inverse() {
        let users = Subspace::new(&Tuple::new().push("users"));
        let key_tuple = Tuple::new().push("alice").push(7i64);
        let key = users.pack(&key_tuple);

        assert!(users.contains(&key));
        assert_eq!(users.unpack(&key).unwrap(), key_tuple);
    }

    #[test]
    fn pack_slice_prefixes_verbatim() {
        let sub = Subspace::new(&Tuple::new().push("s"));
        let raw = Tuple::new().push(1i64).pack();
        assert_eq!(sub.pack_slice(&raw), sub.pack(&Tuple::new().push(1i64)));
    }

    #[test]
    fn distinct_subspaces_do_not_overlap() {
        let a = Subspace::new(&Tuple::new().push("a"));
        let b = Subspace::new(&Tuple::new().push("b"));

        let key = a.pack(&Tuple::new().push("k"));
        assert!(a.contains(&key));
        assert!(!b.contains(&key));

        let (a_begin, a_end) = a.range();
        let (b_begin, _) = b.range();
        assert!(a_end <= b_begin);
        assert!(key >= a_begin && key < a_end);
    }

    #[test]
    fn nested_subspace_extends_the_prefix() {
        let users = Subspace::new(&Tuple::new().push("users"));
        let alice = users.subspace(&Tuple::new().push("alice"));

        let key = alice.pack(&Tuple::new().push("profile"));
        assert!(users.contains(&key));
        assert!(alice.contains(&key));
        assert_eq!(alice.unpack(&key).unwrap(), Tuple::new().push("profile"));
    }

    #[test]
    fn range_brackets_every_member_key() {
        let sub = Subspace::new(&Tuple::new().push("counters").push(3i64));
        let (begin, end) = sub.range();

        let inside = sub.pack(&Tuple::new().push(vec![0u8; 4]));
        assert!(inside >= begin && inside < end);

        let outside = Subspace::new(&Tuple::new().push("counters").push(4i64)).pack(&Tuple::new());
        assert!(!(outside >= begin && outside < end));
    }

    #[test]
    fn unpack_rejects_foreign_keys() {
        let users = Subspace::new(&Tuple::new().push("users"));
        let orders = Subspace::new(&Tuple::new().push("orders"));

        let key = orders.pack(&Tuple::new().push(1i64));
        assert!(matches!(users.unpack(&key), Err(SubspaceError::PrefixMismatch { .. })));
        assert!(matches!(users.unpack(&Slice::nil()), Err(SubspaceError::PrefixMismatch { .. })));
    }

    #[test]
    fn unpack_rejects_malformed_suffix() {
        let sub = Subspace::new(&Tuple::new().push("s"));
        let mut bytes = sub.prefix().to_vec();
        bytes.push(0x30);
        assert!(matches!(
            sub.unpack(&Slice::from_vec(bytes)),
            Err(SubspaceError::Decode { .. })
        ));
    }

    #[test]
    fn strinc_increments_last_byte() {
        let sub = Subspace::new(&Tuple::new().push("abc"));
        let bound = sub.strinc().unwrap();
        assert!(bound > *sub.prefix());

        let key = sub.pack(&Tuple::new().push("anything"));
        assert!(key < bound);

        assert!(Subspace::from_slice(Slice::from_vec(vec![0xFF, 0xFF])).strinc().is_none());
        assert_eq!(
            Subspace::from_slice(Slice::from_vec(vec![0x01, 0xFF])).strinc().unwrap(),
            Slice::from_vec(vec![0x02])
        );
    }

    #[test]
    fn root_subspace_contains_everything() {
        let root = Subspace::new(&Tuple::new());
        assert!(root.prefix().is_empty());
        assert!(root.contains(&Tuple::new().push("any").pack()));
    }
}
