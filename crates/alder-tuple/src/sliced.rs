//! Lazy view over an encoded tuple.
//!
//! A [`SlicedTuple`] holds a packed slice and an index of element start
//! offsets. The index is built on first demand by walking the tag structure
//! once, without decoding any payloads; individual elements are then decoded
//! only when asked for. This keeps key comparisons and partial extraction
//! cheap on hot paths where most elements are never looked at.
//!
//! The view moves through exactly two states, {unindexed} then {indexed};
//! the transition is idempotent and the tuple is immutable throughout, so a
//! `SlicedTuple` can be shared across threads freely.

use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::OnceLock;

use alder_slice::Slice;
use snafu::ResultExt;

use crate::codec;
use crate::element::Element;
use crate::element::TryFromElement;
use crate::error::CodecError;
use crate::error::CodecSnafu;
use crate::error::TupleError;
use crate::tuple::clamp_range;
use crate::tuple::resolve_index;
use crate::tuple::Tuple;

/// Lazily decoded view over a packed tuple.
///
/// # Example
///
/// ```
/// use alder_tuple::SlicedTuple;
/// use alder_tuple::Tuple;
///
/// let packed = Tuple::new().push("users").push(42i64).push("profile").pack();
/// let view = SlicedTuple::new(packed);
///
/// assert_eq!(view.len().unwrap(), 3);
/// assert_eq!(view.get_as::<i64>(1).unwrap(), 42);
/// // Raw access returns the encoded bytes of one element, unparsed.
/// assert_eq!(view.raw(1).unwrap().to_hex(), "152a");
/// ```
#[derive(Default)]
pub struct SlicedTuple {
    data: Slice,
    /// Element boundaries `off[0..=count]`, built once on first demand.
    index: OnceLock<Result<Box<[usize]>, CodecError>>,
}

impl SlicedTuple {
    /// Wrap a packed slice without validating it. The boundary index is
    /// built, and malformed bytes reported, on the first size or element
    /// access.
    pub fn new(data: Slice) -> Self {
        Self {
            data,
            index: OnceLock::new(),
        }
    }

    /// Pack a constructed tuple into a lazy view.
    pub fn from_tuple(tuple: &Tuple) -> Self {
        Self::new(tuple.pack())
    }

    /// The underlying packed bytes.
    pub fn as_slice(&self) -> &Slice {
        &self.data
    }

    /// Consume the view and return the packed bytes.
    pub fn into_slice(self) -> Slice {
        self.data
    }

    /// Element boundaries; walks the encoding once and caches the result.
    fn boundaries(&self) -> Result<&[usize], TupleError> {
        let cached = self.index.get_or_init(|| {
            let bytes = self.data.as_bytes();
            let mut offsets = vec![0];
            let mut offset = 0;
            while offset < bytes.len() {
                offset += codec::element_width(bytes, offset)?;
                offsets.push(offset);
            }
            Ok(offsets.into_boxed_slice())
        });
        match cached {
            Ok(offsets) => Ok(offsets),
            Err(e) => Err(TupleError::Codec { source: e.clone() }),
        }
    }

    /// Number of elements. Forces the index.
    pub fn len(&self) -> Result<usize, TupleError> {
        Ok(self.boundaries()?.len() - 1)
    }

    /// Whether the tuple has no elements. Forces the index.
    pub fn is_empty(&self) -> Result<bool, TupleError> {
        Ok(self.len()? == 0)
    }

    /// The raw encoded bytes of element `index`, as a window sharing this
    /// view's buffer. Negative indices count from the end.
    pub fn raw(&self, index: isize) -> Result<Slice, TupleError> {
        let offsets = self.boundaries()?;
        let i = resolve_index(index, offsets.len() - 1)?;
        let (start, end) = (offsets[i], offsets[i + 1]);
        // Boundaries come from walking `data`, so the window always fits.
        Ok(self
            .data
            .substring_with_count(start, end - start)
            .expect("element boundary within slice"))
    }

    /// Decode element `index` on demand. Negative indices count from the
    /// end.
    pub fn get(&self, index: isize) -> Result<Element, TupleError> {
        let offsets = self.boundaries()?;
        let i = resolve_index(index, offsets.len() - 1)?;
        let (element, _) = codec::decode_element(self.data.as_bytes(), offsets[i]).context(CodecSnafu)?;
        Ok(element)
    }

    /// Decode element `index` into a concrete type.
    pub fn get_as<T: TryFromElement>(&self, index: isize) -> Result<T, TupleError> {
        T::try_from_element(self.get(index)?)
    }

    /// The first element, converted. Fails on an empty tuple.
    pub fn first<T: TryFromElement>(&self) -> Result<T, TupleError> {
        if self.is_empty()? {
            return Err(TupleError::EmptyTuple);
        }
        self.get_as(0)
    }

    /// The last element, converted. Fails on an empty tuple.
    pub fn last<T: TryFromElement>(&self) -> Result<T, TupleError> {
        if self.is_empty()? {
            return Err(TupleError::EmptyTuple);
        }
        self.get_as(-1)
    }

    /// A new view with `element` appended. The existing encoding is reused
    /// verbatim; only the new element is encoded.
    pub fn append<E: Into<Element>>(&self, element: E) -> Self {
        let mut buf = self.data.to_vec();
        element.into().pack_into(&mut buf);
        Self::new(Slice::from_vec(buf))
    }

    /// A new view holding this tuple's elements followed by `other`'s,
    /// formed by concatenating the two encodings.
    pub fn concat(&self, other: &SlicedTuple) -> Self {
        let mut buf = self.data.to_vec();
        buf.extend_from_slice(other.data.as_bytes());
        Self::new(Slice::from_vec(buf))
    }

    /// The sub-range `[from, to)` as a new view sharing this buffer.
    /// Negative indices count from the end and are clamped; an inverted or
    /// empty range yields the canonical empty tuple.
    pub fn slice(&self, from: isize, to: isize) -> Result<Self, TupleError> {
        let offsets = self.boundaries()?;
        let len = offsets.len() - 1;
        let (from, to) = clamp_range(from, to, len);
        let (start, end) = (offsets[from], offsets[to]);
        let window = self
            .data
            .substring_with_count(start, end - start)
            .expect("element boundary within slice");
        Ok(Self::new(window))
    }

    /// Materialize every element into a constructed [`Tuple`].
    pub fn decode(&self) -> Result<Tuple, TupleError> {
        Tuple::unpack_bytes(self.data.as_bytes()).context(CodecSnafu)
    }
}

impl Clone for SlicedTuple {
    fn clone(&self) -> Self {
        // The boundary index is cheap to rebuild; share only the bytes.
        Self::new(self.data.clone())
    }
}

impl From<Slice> for SlicedTuple {
    fn from(data: Slice) -> Self {
        Self::new(data)
    }
}

impl PartialEq for SlicedTuple {
    /// Encodings produced by this crate are canonical, so byte equality of
    /// the packed form is element equality.
    fn eq(&self, other: &Self) -> bool {
        self.data.as_bytes() == other.data.as_bytes()
    }
}

impl Eq for SlicedTuple {}

impl Hash for SlicedTuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Debug for SlicedTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlicedTuple").field("data", &self.data).finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
