//! Error types shared across the codec.

use snafu::Snafu;

/// Errors raised while decoding tuple bytes.
///
/// These always indicate malformed input, never a bad request: the encoders
/// in this crate cannot produce bytes that fail to decode.
#[derive(Debug, Clone, Snafu)]
pub enum CodecError {
    /// Input ended in the middle of an element.
    #[snafu(display("unexpected end of input at offset {offset}"))]
    UnexpectedEnd {
        /// Byte offset where the error occurred.
        offset: usize,
    },

    /// Leading byte is not a known type tag.
    #[snafu(display("unknown type tag 0x{tag:02X} at offset {offset}"))]
    UnknownTag {
        /// The unknown tag byte.
        tag: u8,
        /// Byte offset where the error occurred.
        offset: usize,
    },

    /// A byte-string or string element ran off the end without its `0x00`
    /// terminator.
    #[snafu(display("missing terminator for element at offset {offset}"))]
    MissingTerminator {
        /// Byte offset of the element payload.
        offset: usize,
    },

    /// String element payload is not valid UTF-8.
    #[snafu(display("invalid UTF-8 at offset {offset}: {source}"))]
    InvalidUtf8 {
        /// Byte offset of the element payload.
        offset: usize,
        /// The underlying UTF-8 error.
        source: std::str::Utf8Error,
    },

    /// Integer payload does not fit a signed 64-bit value.
    #[snafu(display("integer overflow at offset {offset}"))]
    IntegerOverflow {
        /// Byte offset of the element.
        offset: usize,
    },
}

/// Errors raised by tuple accessors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TupleError {
    /// The underlying bytes are malformed.
    #[snafu(display("malformed tuple bytes: {source}"))]
    Codec {
        /// The decoding failure.
        source: CodecError,
    },

    /// Element index outside the tuple.
    #[snafu(display("index {index} out of range for tuple of {len} elements"))]
    IndexOutOfRange {
        /// The requested index (before negative-index resolution).
        index: isize,
        /// Number of elements in the tuple.
        len: usize,
    },

    /// The element decoded fine but has the wrong kind or does not fit the
    /// requested type.
    #[snafu(display("cannot convert {actual} element to {expected}"))]
    TypeMismatch {
        /// The requested target type.
        expected: &'static str,
        /// The kind of the decoded element.
        actual: &'static str,
    },

    /// `first`/`last` on a tuple with no elements.
    #[snafu(display("tuple is empty"))]
    EmptyTuple,
}
