//! Segment source: the narrow view of host string storage the engine reads.
//!
//! Hosts that keep strings as a chain of storage runs (one-byte ASCII runs
//! interleaved with two-byte runs) expose them as an ordered sequence of
//! [`Segment`]s. The engine walks that sequence once, front to back, and never
//! needs the string flattened.
//!
//! Invariants
//! - Segments partition the string in order with no gaps or overlaps.
//! - An ASCII segment only holds bytes `<= 0x7F`. This is checked when the
//!   segment is built, because the engine copies ASCII bytes to the output
//!   verbatim.
//! - Segments may be empty, and a surrogate pair may straddle two segments.
//!   The engine handles both.

use core::{fmt, iter::FusedIterator, slice};

use bstr::BStr;

use crate::error::SegmentError;

/// Storage tag of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Every unit is `<= 0x7F` and stored as one byte.
    Ascii,
    /// General UTF-16 code units.
    Wide,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Repr<'a> {
    Ascii(&'a [u8]),
    Wide(&'a [u16]),
}

/// A borrowed run of code units sharing one storage representation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub(crate) repr: Repr<'a>,
}

impl<'a> Segment<'a> {
    /// Creates an ASCII segment, checking that every byte is `<= 0x7F`.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NonAscii`] for the first byte above `0x7F`.
    pub fn ascii(bytes: &'a [u8]) -> Result<Self, SegmentError> {
        if let Some(index) = bytes.iter().position(|b| !b.is_ascii()) {
            return Err(SegmentError::NonAscii {
                index,
                byte: bytes[index],
            });
        }
        Ok(Self {
            repr: Repr::Ascii(bytes),
        })
    }

    /// Creates an ASCII segment from text.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NonAscii`] if `s` contains any non-ASCII
    /// character; `index` is the byte offset of its first byte.
    pub fn ascii_str(s: &'a str) -> Result<Self, SegmentError> {
        Self::ascii(s.as_bytes())
    }

    /// Creates a wide segment. Any code unit is accepted, including unpaired
    /// surrogates.
    #[must_use]
    pub fn wide(units: &'a [u16]) -> Self {
        Self {
            repr: Repr::Wide(units),
        }
    }

    /// Storage tag.
    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        match self.repr {
            Repr::Ascii(_) => SegmentKind::Ascii,
            Repr::Wide(_) => SegmentKind::Wide,
        }
    }

    /// Length in code units.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.repr {
            Repr::Ascii(b) => b.len(),
            Repr::Wide(w) => w.len(),
        }
    }

    /// Whether the segment holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The code unit at `index`, widened to `u16` for ASCII segments.
    #[must_use]
    pub fn unit(&self, index: usize) -> Option<u16> {
        match self.repr {
            Repr::Ascii(b) => b.get(index).copied().map(u16::from),
            Repr::Wide(w) => w.get(index).copied(),
        }
    }

    /// Iterates the code units in order.
    pub fn units(&self) -> impl Iterator<Item = u16> + 'a {
        let (ascii, wide): (&'a [u8], &'a [u16]) = match self.repr {
            Repr::Ascii(b) => (b, &[]),
            Repr::Wide(w) => (&[], w),
        };
        ascii
            .iter()
            .map(|&b| u16::from(b))
            .chain(wide.iter().copied())
    }
}

impl fmt::Debug for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            Repr::Ascii(b) => f.debug_tuple("Ascii").field(&BStr::new(b)).finish(),
            Repr::Wide(w) => f.debug_tuple("Wide").field(&w).finish(),
        }
    }
}

/// A whole UTF-16 string that can present itself as a segment source.
///
/// This is the host-side capability the [`Utf8Writer`](crate::Utf8Writer)
/// facade wraps. The string must not change while it is borrowed.
pub trait Utf16Text {
    /// Segment iterator; one forward pass over the string's storage.
    type Segments<'a>: Iterator<Item = Segment<'a>>
    where
        Self: 'a;

    /// Returns the segments covering the whole string, in order.
    fn segments(&self) -> Self::Segments<'_>;

    /// Length in UTF-16 code units.
    fn len_utf16(&self) -> usize;

    /// Whether the string is cheaply known to contain only ASCII code units.
    ///
    /// Implementations that would have to scan should return `false`; the
    /// engine then computes the length the normal way.
    fn known_ascii(&self) -> bool {
        false
    }
}

impl Utf16Text for [u16] {
    type Segments<'a> = core::iter::Once<Segment<'a>>;

    fn segments(&self) -> Self::Segments<'_> {
        core::iter::once(Segment::wide(self))
    }

    fn len_utf16(&self) -> usize {
        self.len()
    }
}

impl<'s> Utf16Text for [Segment<'s>] {
    type Segments<'a>
        = SliceSegments<'a, 's>
    where
        Self: 'a;

    fn segments(&self) -> Self::Segments<'_> {
        SliceSegments { inner: self.iter() }
    }

    fn len_utf16(&self) -> usize {
        self.iter().map(Segment::len).sum()
    }

    fn known_ascii(&self) -> bool {
        self.iter().all(|s| s.kind() == SegmentKind::Ascii)
    }
}

/// Iterator over a borrowed slice of [`Segment`]s.
#[derive(Debug, Clone)]
pub struct SliceSegments<'a, 's> {
    inner: slice::Iter<'a, Segment<'s>>,
}

impl<'a> Iterator for SliceSegments<'a, '_> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for SliceSegments<'_, '_> {}
impl FusedIterator for SliceSegments<'_, '_> {}
