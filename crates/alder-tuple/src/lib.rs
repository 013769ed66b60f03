//! Order-preserving binary tuple codec.
//!
//! This crate maps ordered sequences of typed elements to byte strings whose
//! lexicographic byte order matches the natural ordering of the decoded
//! tuples, so packed tuples can be used directly as database keys and range
//! scans behave like ordered iteration over tuples.
//!
//! # Design
//!
//! 1. **Lexicographic ordering**: packed bytes sort in the same order as the
//!    original tuple elements.
//! 2. **Type-tagged encoding**: each element starts with a tag byte, allowing
//!    heterogeneous tuples and unambiguous decoding.
//! 3. **Null-safe**: embedded `0x00` bytes inside string and byte-string
//!    payloads are escaped so the terminator stays unambiguous.
//! 4. **Lazy decoding**: [`SlicedTuple`] indexes element boundaries in an
//!    encoded slice once and decodes individual elements on demand.
//!
//! # Type tags
//!
//! | Tag | Type | Payload |
//! |------|------|---------|
//! | 0x00 | Nil | none |
//! | 0x01 | Bytes | escaped bytes, 0x00 terminator |
//! | 0x02 | String | escaped UTF-8, 0x00 terminator |
//! | 0x0C..0x13 | Negative integer | one's complement magnitude, 8..1 bytes |
//! | 0x14 | Integer zero | none |
//! | 0x15..0x1C | Positive integer | big-endian magnitude, 1..8 bytes |
//!
//! Booleans are accepted as inputs and encode as the integers 0 and 1.
//!
//! # Example
//!
//! ```
//! use alder_tuple::Element;
//! use alder_tuple::SlicedTuple;
//! use alder_tuple::Tuple;
//!
//! let tuple = Tuple::new().push("users").push(42i64);
//! let packed = tuple.pack();
//!
//! let lazy = SlicedTuple::new(packed);
//! assert_eq!(lazy.get_as::<String>(0).unwrap(), "users");
//! assert_eq!(lazy.get_as::<i64>(-1).unwrap(), 42);
//! ```

mod codec;
mod element;
mod error;
mod sliced;
mod subspace;
mod tuple;

pub use codec::TupleWriter;
pub use element::Element;
pub use element::TryFromElement;
pub use error::CodecError;
pub use error::TupleError;
pub use sliced::SlicedTuple;
pub use subspace::Subspace;
pub use subspace::SubspaceError;
pub use tuple::Tuple;
