//! Immutable byte slice primitive for ordered keyspaces.
//!
//! Every key and value that travels between the client layers and the
//! database is a [`Slice`]: a cheaply clonable window over a shared,
//! read-only byte buffer. Cloning a slice copies three words, never the
//! bytes; [`Slice::memoize`] is the one operation that detaches a view into
//! an exclusively owned copy.
//!
//! The comparison and hashing semantics of `Slice` are load-bearing: the
//! lexicographic unsigned-byte order of slices is exactly the order in which
//! the database stores keys, so every layer above (tuples, subspaces, range
//! scans) inherits its correctness from this type.

mod slice;

pub use slice::Slice;
pub use slice::SliceError;
