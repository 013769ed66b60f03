//! The [`Slice`] value type: an immutable `(buffer, offset, len)` window.
//!
//! # States
//!
//! A slice is one of three things:
//!
//! - **Nil**: carries no buffer at all (`has_value() == false`). The
//!   distinguished "absent" key or value.
//! - **Empty**: a zero-length window over a real buffer.
//! - **Non-empty**: a window of one or more bytes.
//!
//! Nil and Empty both behave as length-0 byte sequences, but they are not
//! equal to each other: `has_value` distinguishes them and so does `==`.
//!
//! # Sharing
//!
//! The backing buffer is an `Arc<[u8]>`; any number of slices may alias it,
//! and none of them may mutate it. The buffer lives as long as the
//! longest-held slice. [`Slice::memoize`] returns a slice that exclusively
//! owns a fresh copy of its window, which is the only way to detach from
//! shared backing memory.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use snafu::ensure;
use snafu::ResultExt;
use snafu::Snafu;

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET: u32 = 0x811C_9DC5;

/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 0x0100_0193;

// =============================================================================
// Error Types
// =============================================================================

/// Errors surfaced by slice accessors and textual constructors.
#[derive(Debug, Snafu)]
pub enum SliceError {
    /// Byte index outside the slice window.
    #[snafu(display("index {index} out of range for slice of {len} bytes"))]
    IndexOutOfRange {
        /// The requested index (after negative-index resolution).
        index: isize,
        /// Length of the slice.
        len: usize,
    },

    /// Sub-window does not fit inside the slice.
    #[snafu(display("window [{offset}, {offset}+{count}) out of range for slice of {len} bytes"))]
    WindowOutOfRange {
        /// Start of the requested window.
        offset: usize,
        /// Length of the requested window.
        count: usize,
        /// Length of the slice.
        len: usize,
    },

    /// Unsigned integer reads are limited to eight bytes.
    #[snafu(display("cannot read a {bytes}-byte unsigned integer (maximum is 8)"))]
    InvalidUintWidth {
        /// The requested width.
        bytes: usize,
    },

    /// Hex strings must contain an even number of digits.
    #[snafu(display("hex string has odd length {len}"))]
    OddHexLength {
        /// Length of the input string.
        len: usize,
    },

    /// Non-hexadecimal character in a hex string.
    #[snafu(display("invalid hex digit at position {position}"))]
    InvalidHex {
        /// Byte position of the offending character.
        position: usize,
    },

    /// Base64 payload failed to parse.
    #[snafu(display("invalid base64 input: {source}"))]
    InvalidBase64 {
        /// The underlying decoder error.
        source: base64::DecodeError,
    },

    /// An escape sequence `<HH>` was opened but never closed.
    #[snafu(display("unterminated escape sequence at offset {offset}"))]
    UnterminatedEscape {
        /// Byte offset of the opening `<`.
        offset: usize,
    },

    /// Malformed escape sequence or a byte that `escape` never emits.
    #[snafu(display("invalid escape sequence at offset {offset}"))]
    InvalidEscape {
        /// Byte offset where the error occurred.
        offset: usize,
    },
}

// =============================================================================
// Slice
// =============================================================================

/// A window over a shared immutable byte buffer.
#[derive(Clone)]
struct Window {
    buf: Arc<[u8]>,
    offset: usize,
    len: usize,
}

/// Immutable, zero-copy view over a byte buffer.
///
/// See the [module documentation](self) for the Nil / Empty / non-empty
/// distinction and the sharing rules.
///
/// # Example
///
/// ```
/// use alder_slice::Slice;
///
/// let s = Slice::from_vec(b"hello world".to_vec());
/// let world = s.substring(6).unwrap();
/// assert_eq!(world.as_bytes(), b"world");
///
/// // Both views alias the same buffer; neither copied any bytes.
/// assert_eq!(s.substring(-5).unwrap(), world);
/// ```
#[derive(Clone, Default)]
pub struct Slice {
    repr: Option<Window>,
}

impl Slice {
    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    /// The Nil slice: no buffer, `has_value() == false`.
    pub const fn nil() -> Self {
        Self { repr: None }
    }

    /// A zero-length slice backed by a real (empty) buffer.
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Take ownership of a buffer and view the whole of it.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        let buf: Arc<[u8]> = buf.into();
        let len = buf.len();
        Self {
            repr: Some(Window { buf, offset: 0, len }),
        }
    }

    /// View a window of a shared buffer without copying.
    ///
    /// Fails if `[offset, offset + len)` does not fit inside `buf`.
    pub fn from_arc(buf: Arc<[u8]>, offset: usize, len: usize) -> Result<Self, SliceError> {
        ensure!(
            offset <= buf.len() && len <= buf.len() - offset,
            WindowOutOfRangeSnafu {
                offset,
                count: len,
                len: buf.len()
            }
        );
        Ok(Self {
            repr: Some(Window { buf, offset, len }),
        })
    }

    /// Copy borrowed bytes into a freshly owned buffer.
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }

    /// Allocate a zero-filled slice of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![0; len])
    }

    /// Byte view of a string's UTF-8 encoding.
    pub fn from_utf8(s: &str) -> Self {
        Self::copy_from(s.as_bytes())
    }

    /// Byte view of an ASCII string.
    ///
    /// For ASCII input this is identical to [`Slice::from_utf8`]; the
    /// separate entry point documents intent at call sites that require
    /// single-byte characters.
    pub fn from_ascii(s: &str) -> Self {
        debug_assert!(s.is_ascii(), "from_ascii called with non-ASCII input");
        Self::copy_from(s.as_bytes())
    }

    /// Decode a standard base64 string. An empty input yields Empty.
    pub fn from_base64(s: &str) -> Result<Self, SliceError> {
        let bytes = BASE64.decode(s).context(InvalidBase64Snafu)?;
        Ok(Self::from_vec(bytes))
    }

    /// Decode a hex string (even length, mixed case). An empty input yields
    /// Empty.
    pub fn from_hex(s: &str) -> Result<Self, SliceError> {
        match hex::decode(s) {
            Ok(bytes) => Ok(Self::from_vec(bytes)),
            Err(hex::FromHexError::InvalidHexCharacter { index, .. }) => InvalidHexSnafu { position: index }.fail(),
            Err(hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength) => {
                OddHexLengthSnafu { len: s.len() }.fail()
            }
        }
    }

    /// Invert [`Slice::escape`]: literal ASCII bytes pass through, `<HH>`
    /// sequences decode to the escaped byte. Input that `escape` could not
    /// have produced is rejected.
    pub fn unescape(s: &str) -> Result<Self, SliceError> {
        let input = s.as_bytes();
        let mut bytes = Vec::with_capacity(input.len());
        let mut i = 0;

        while i < input.len() {
            match input[i] {
                b'<' => {
                    ensure!(i + 3 < input.len(), UnterminatedEscapeSnafu { offset: i });
                    ensure!(input[i + 3] == b'>', UnterminatedEscapeSnafu { offset: i });
                    let pair = hex::decode(&input[i + 1..i + 3])
                        .map_err(|_| SliceError::InvalidEscape { offset: i + 1 })?;
                    bytes.push(pair[0]);
                    i += 4;
                }
                b if b < 0x80 => {
                    bytes.push(b);
                    i += 1;
                }
                _ => return InvalidEscapeSnafu { offset: i }.fail(),
            }
        }
        Ok(Self::from_vec(bytes))
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Whether this slice carries a buffer. False only for Nil.
    pub fn has_value(&self) -> bool {
        self.repr.is_some()
    }

    /// Whether this slice is a zero-length window over a real buffer.
    /// Nil is *not* empty; it is nil.
    pub fn is_empty(&self) -> bool {
        matches!(&self.repr, Some(w) if w.len == 0)
    }

    /// Whether this slice is Nil or zero-length.
    pub fn is_null_or_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes in the window; 0 for Nil.
    pub fn len(&self) -> usize {
        self.repr.as_ref().map_or(0, |w| w.len)
    }

    /// The bytes of the window. Nil yields an empty borrow.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.repr {
            Some(w) => &w.buf[w.offset..w.offset + w.len],
            None => &[],
        }
    }

    /// Copy the window into a fresh `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Byte at index `i`. Negative `i` counts from the end (`i += len`).
    pub fn at(&self, i: isize) -> Result<u8, SliceError> {
        let len = self.len();
        let resolved = if i < 0 { i + len as isize } else { i };
        if resolved < 0 || resolved as usize >= len {
            return IndexOutOfRangeSnafu { index: i, len }.fail();
        }
        Ok(self.as_bytes()[resolved as usize])
    }

    /// Suffix starting at `offset` when `offset >= 0`; the last `|offset|`
    /// bytes when `offset < 0`. Requires `|offset| <= len`.
    pub fn substring(&self, offset: isize) -> Result<Self, SliceError> {
        let len = self.len();
        if offset >= 0 {
            let offset = offset as usize;
            ensure!(offset <= len, WindowOutOfRangeSnafu { offset, count: len - offset.min(len), len });
            self.substring_with_count(offset, len - offset)
        } else {
            let count = offset.unsigned_abs();
            ensure!(count <= len, WindowOutOfRangeSnafu { offset: 0usize, count, len });
            self.substring_with_count(len - count, count)
        }
    }

    /// The sub-window `[offset, offset + count)`. Requires
    /// `offset + count <= len`.
    pub fn substring_with_count(&self, offset: usize, count: usize) -> Result<Self, SliceError> {
        let len = self.len();
        ensure!(offset <= len && count <= len - offset, WindowOutOfRangeSnafu { offset, count, len });
        match &self.repr {
            Some(w) => Ok(Self {
                repr: Some(Window {
                    buf: Arc::clone(&w.buf),
                    offset: w.offset + offset,
                    len: count,
                }),
            }),
            // Nil has len 0, so only (0, 0) reaches here; keep it Nil.
            None => Ok(Self::nil()),
        }
    }

    /// Decode `bytes` bytes starting at `offset` as a little-endian unsigned
    /// integer: `sum of buffer[offset + i] * 256^i`. `bytes` must be at most
    /// 8; zero bytes decode to 0.
    pub fn read_uint_le(&self, offset: usize, bytes: usize) -> Result<u64, SliceError> {
        ensure!(bytes <= 8, InvalidUintWidthSnafu { bytes });
        let len = self.len();
        ensure!(offset <= len && bytes <= len - offset, WindowOutOfRangeSnafu { offset, count: bytes, len });

        let window = &self.as_bytes()[offset..offset + bytes];
        let mut value = 0u64;
        for &b in window.iter().rev() {
            value = (value << 8) | u64::from(b);
        }
        Ok(value)
    }

    /// An independent slice that exclusively owns a fresh copy of its bytes.
    /// Nil stays Nil.
    pub fn memoize(&self) -> Self {
        match &self.repr {
            Some(_) => Self::copy_from(self.as_bytes()),
            None => Self::nil(),
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// Human-readable ASCII rendering: bytes below `0x20`, at or above
    /// `0x7F`, or equal to `<` render as `<HH>` (uppercase); everything else
    /// renders literally.
    pub fn escape(&self) -> String {
        let mut out = String::with_capacity(self.len());
        for &b in self.as_bytes() {
            if b < 0x20 || b >= 0x7F || b == b'<' {
                out.push_str(&format!("<{b:02X}>"));
            } else {
                out.push(b as char);
            }
        }
        out
    }

    /// Two lowercase hex digits per byte.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Standard base64 rendering of the window.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.as_bytes())
    }

    /// 32-bit FNV-1a over the byte window. Nil hashes as 0.
    pub fn fnv32(&self) -> u32 {
        match &self.repr {
            Some(_) => {
                let mut hash = FNV_OFFSET;
                for &b in self.as_bytes() {
                    hash ^= u32::from(b);
                    hash = hash.wrapping_mul(FNV_PRIME);
                }
                hash
            }
            None => 0,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        // Nil equals only Nil; otherwise byte equality of the windows.
        self.has_value() == other.has_value() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Slice {}

impl PartialOrd for Slice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slice {
    /// Nil orders before every slice that has a value (including Empty);
    /// otherwise lexicographic unsigned-byte order with shorter-is-less
    /// tiebreak, matching the order in which the database stores keys.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.has_value(), other.has_value()) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (true, true) => self.as_bytes().cmp(other.as_bytes()),
        }
    }
}

impl Hash for Slice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.fnv32());
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Some(_) => write!(f, "Slice(\"{}\")", self.escape()),
            None => write!(f, "Slice(nil)"),
        }
    }
}

impl AsRef<[u8]> for Slice {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Vec<u8>> for Slice {
    fn from(buf: Vec<u8>) -> Self {
        Self::from_vec(buf)
    }
}

impl From<&[u8]> for Slice {
    fn from(bytes: &[u8]) -> Self {
        Self::copy_from(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for Slice {
    fn from(bytes: [u8; N]) -> Self {
        Self::from_vec(bytes.to_vec())
    }
}

impl From<&str> for Slice {
    fn from(s: &str) -> Self {
        Self::from_utf8(s)
    }
}

impl From<String> for Slice {
    fn from(s: String) -> Self {
        Self::from_vec(s.into_bytes())
    }
}

// =============================================================================
// Tests
// =============================================================================
