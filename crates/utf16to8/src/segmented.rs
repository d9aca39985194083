//! An owned, in-memory string stored as a chain of ASCII and wide runs.
//!
//! This is the shape a host heap typically gives its strings after
//! concatenation: some pieces are one-byte ASCII, others two-byte. Runs are
//! kept exactly as pushed (adjacent runs of the same kind are not merged), so
//! callers can reproduce any partition a host might produce, including empty
//! runs and surrogate pairs split across runs.

use alloc::{boxed::Box, vec::Vec};
use core::{fmt, slice};

use bstr::BStr;

use crate::{
    error::SegmentError,
    segment::{Repr, Segment, Utf16Text},
};

#[derive(Clone, PartialEq, Eq)]
enum Run {
    Ascii(Box<[u8]>),
    Wide(Box<[u16]>),
}

impl Run {
    fn as_segment(&self) -> Segment<'_> {
        match self {
            // Checked on push.
            Run::Ascii(b) => Segment {
                repr: Repr::Ascii(&b[..]),
            },
            Run::Wide(w) => Segment::wide(&w[..]),
        }
    }
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Run::Ascii(b) => f.debug_tuple("Ascii").field(&BStr::new(b)).finish(),
            Run::Wide(w) => f.debug_tuple("Wide").field(w).finish(),
        }
    }
}

/// Owned UTF-16 text stored as a sequence of ASCII and wide runs.
///
/// ```rust
/// use utf16to8::{SegmentedString, Utf8Writer};
///
/// let mut s = SegmentedString::new();
/// s.push_ascii(b"smile: ").unwrap();
/// s.push_wide(&[0xD83D]);
/// s.push_wide(&[0xDE00]);
///
/// let writer = Utf8Writer::new(&s);
/// assert_eq!(writer.len(), 11);
/// assert_eq!(writer.to_utf8_string(), "smile: \u{1F600}");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SegmentedString {
    runs: Vec<Run>,
    len_utf16: usize,
    non_ascii_units: usize,
}

impl SegmentedString {
    /// Creates an empty string with no runs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits `units` into maximal ASCII and wide runs.
    ///
    /// Every maximal run of units `<= 0x7F` becomes an ASCII run; everything
    /// else (including unpaired surrogates) lands in wide runs.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_utf16(units: &[u16]) -> Self {
        let mut out = Self::new();
        let mut rest = units;
        while let Some(&first) = rest.first() {
            let ascii = first < 0x80;
            let end = rest
                .iter()
                .position(|&u| (u < 0x80) != ascii)
                .unwrap_or(rest.len());
            let (run, tail) = rest.split_at(end);
            if ascii {
                let bytes: Box<[u8]> = run.iter().map(|&u| u as u8).collect();
                out.len_utf16 += bytes.len();
                out.runs.push(Run::Ascii(bytes));
            } else {
                out.push_wide(run);
            }
            rest = tail;
        }
        out
    }

    /// Appends an ASCII run.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::NonAscii`] and leaves `self` unchanged if any
    /// byte is above `0x7F`.
    pub fn push_ascii(&mut self, bytes: &[u8]) -> Result<(), SegmentError> {
        Segment::ascii(bytes)?;
        self.len_utf16 += bytes.len();
        self.runs.push(Run::Ascii(bytes.into()));
        Ok(())
    }

    /// Appends a wide run. Unpaired surrogates are accepted as-is.
    pub fn push_wide(&mut self, units: &[u16]) {
        self.len_utf16 += units.len();
        self.non_ascii_units += units.iter().filter(|&&u| u >= 0x80).count();
        self.runs.push(Run::Wide(units.into()));
    }

    /// Appends `s` as UTF-16, splitting it into maximal runs like
    /// [`from_utf16`](Self::from_utf16).
    pub fn push_str(&mut self, s: &str) {
        let units: Vec<u16> = s.encode_utf16().collect();
        let tail = Self::from_utf16(&units);
        self.len_utf16 += tail.len_utf16;
        self.non_ascii_units += tail.non_ascii_units;
        self.runs.extend(tail.runs);
    }

    /// Number of runs, including empty ones.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Whether every code unit is `<= 0x7F`, regardless of run kinds.
    #[must_use]
    pub fn is_ascii(&self) -> bool {
        self.non_ascii_units == 0
    }

    /// Collects the code units into one flat buffer.
    #[must_use]
    pub fn to_utf16(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.len_utf16);
        for seg in self.segments() {
            out.extend(seg.units());
        }
        out
    }
}

impl fmt::Debug for SegmentedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.runs).finish()
    }
}

impl From<&str> for SegmentedString {
    fn from(s: &str) -> Self {
        let mut out = Self::new();
        out.push_str(s);
        out
    }
}

impl From<&[u16]> for SegmentedString {
    fn from(units: &[u16]) -> Self {
        Self::from_utf16(units)
    }
}

/// Iterator over the runs of a [`SegmentedString`].
#[derive(Debug, Clone)]
pub struct Runs<'a> {
    inner: slice::Iter<'a, Run>,
}

impl<'a> Iterator for Runs<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        self.inner.next().map(Run::as_segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Runs<'_> {}

impl Utf16Text for SegmentedString {
    type Segments<'a> = Runs<'a>;

    fn segments(&self) -> Runs<'_> {
        Runs {
            inner: self.runs.iter(),
        }
    }

    fn len_utf16(&self) -> usize {
        self.len_utf16
    }

    fn known_ascii(&self) -> bool {
        self.is_ascii()
    }
}
