//! Transcoding engine: segmented UTF-16 in, UTF-8 out.
//!
//! One algorithm serves all three output disciplines (see [`crate::emit`]).
//! The only state carried between segments is a pending lead surrogate, passed
//! explicitly from one segment encoder to the next.
//!
//! Malformed input is repaired, never rejected: every unpaired surrogate
//! becomes U+FFFD (`EF BF BD`). The result matches decoding the flattened
//! units with [`char::decode_utf16`] and replacing each error, regardless of
//! how the string is split into segments.
#![allow(clippy::cast_possible_truncation)]

use crate::{
    emit::{CheckedWriter, Emit, Full, LengthCounter, UncheckedWriter},
    segment::{Repr, Segment},
};

/// U+FFFD encoded as UTF-8.
pub const REPLACEMENT: [u8; 3] = [0xEF, 0xBF, 0xBD];

#[inline]
fn is_trail(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

#[inline]
fn encode_pair(lead: u16, trail: u16) -> [u8; 4] {
    let cp = 0x10000 + ((u32::from(lead) - 0xD800) << 10) + (u32::from(trail) - 0xDC00);
    debug_assert!((0x10000..=0x10_FFFF).contains(&cp));
    [
        (0xF0 | (cp >> 18)) as u8,
        (0x80 | ((cp >> 12) & 0x3F)) as u8,
        (0x80 | ((cp >> 6) & 0x3F)) as u8,
        (0x80 | (cp & 0x3F)) as u8,
    ]
}

fn encode_ascii<E: Emit>(
    bytes: &[u8],
    pending: Option<u16>,
    sink: &mut E,
) -> Result<Option<u16>, Full> {
    if bytes.is_empty() {
        return Ok(pending);
    }
    if pending.is_some() {
        sink.emit(REPLACEMENT)?;
    }
    sink.emit_ascii(bytes)?;
    Ok(None)
}

fn encode_wide<E: Emit>(
    units: &[u16],
    pending: Option<u16>,
    sink: &mut E,
) -> Result<Option<u16>, Full> {
    let mut rest = units;
    if let Some(lead) = pending {
        match rest.split_first() {
            None => return Ok(Some(lead)),
            Some((&trail, tail)) if is_trail(trail) => {
                sink.emit(encode_pair(lead, trail))?;
                rest = tail;
            }
            // The stale lead is replaced; the unit itself is handled below.
            Some(_) => sink.emit(REPLACEMENT)?,
        }
    }

    let mut i = 0;
    while i < rest.len() {
        let c = rest[i];
        match c {
            0..=0x7F => sink.emit([c as u8])?,
            0x80..=0x7FF => sink.emit([(0xC0 | (c >> 6)) as u8, (0x80 | (c & 0x3F)) as u8])?,
            0xD800..=0xDBFF => match rest.get(i + 1) {
                Some(&trail) if is_trail(trail) => {
                    sink.emit(encode_pair(c, trail))?;
                    i += 1;
                }
                Some(_) => sink.emit(REPLACEMENT)?,
                None => return Ok(Some(c)),
            },
            0xDC00..=0xDFFF => sink.emit(REPLACEMENT)?,
            _ => sink.emit([
                (0xE0 | (c >> 12)) as u8,
                (0x80 | ((c >> 6) & 0x3F)) as u8,
                (0x80 | (c & 0x3F)) as u8,
            ])?,
        }
        i += 1;
    }
    Ok(None)
}

fn encode_segments<'a, E, I>(segments: I, sink: &mut E) -> Result<(), Full>
where
    E: Emit,
    I: IntoIterator<Item = Segment<'a>>,
{
    let mut pending = None;
    for segment in segments {
        pending = match segment.repr {
            Repr::Ascii(bytes) => encode_ascii(bytes, pending, sink)?,
            Repr::Wide(units) => encode_wide(units, pending, sink)?,
        };
    }
    if pending.is_some() {
        sink.emit(REPLACEMENT)?;
    }
    Ok(())
}

/// Runs the engine with `sink` and returns the bytes it emitted. Running out
/// of room is not an error here; the count simply stops short.
pub(crate) fn transcode<'a, E, I>(segments: I, sink: &mut E) -> usize
where
    E: Emit,
    I: IntoIterator<Item = Segment<'a>>,
{
    // `Full` only means the checked window is exhausted.
    let _ = encode_segments(segments, sink);
    sink.written()
}

/// Returns the exact UTF-8 length of the segmented string, including three
/// bytes for every replaced surrogate.
///
/// ```rust
/// use utf16to8::{Segment, utf8_len};
///
/// let wide = [0x20AC, 0xD83D];
/// let segments = [Segment::ascii(b"ab").unwrap(), Segment::wide(&wide)];
/// // 'a' 'b', the euro sign, and a replacement for the dangling lead.
/// assert_eq!(utf8_len(segments), 2 + 3 + 3);
/// ```
pub fn utf8_len<'a, I>(segments: I) -> usize
where
    I: IntoIterator<Item = Segment<'a>>,
{
    transcode(segments, &mut LengthCounter::default())
}

/// Writes the UTF-8 encoding into `dest`, stopping before the first sequence
/// that does not fit, and returns the bytes written.
///
/// The output never ends inside a multi-byte sequence, so `&dest[..n]` is
/// always valid UTF-8. ASCII runs may be cut at any byte.
///
/// ```rust
/// use utf16to8::{Segment, encode_utf8_into};
///
/// let wide = [0x00E9, 0x20AC];
/// let mut buf = [0u8; 4];
/// // "é" fits (2 bytes); "€" needs 3 and only 2 remain.
/// assert_eq!(encode_utf8_into([Segment::wide(&wide)], &mut buf), 2);
/// assert_eq!(&buf[..2], "é".as_bytes());
/// ```
pub fn encode_utf8_into<'a, I>(segments: I, dest: &mut [u8]) -> usize
where
    I: IntoIterator<Item = Segment<'a>>,
{
    transcode(segments, &mut CheckedWriter::new(dest))
}

/// Writes the full UTF-8 encoding to `dest` without bound checks and returns
/// the bytes written.
///
/// # Safety
///
/// `dest` must be valid for writes of [`utf8_len`] bytes for the same
/// segments, and must not overlap the segments' storage.
pub unsafe fn encode_utf8_unchecked<'a, I>(segments: I, dest: *mut u8) -> usize
where
    I: IntoIterator<Item = Segment<'a>>,
{
    // SAFETY: forwarded to the caller.
    let mut sink = unsafe { UncheckedWriter::new(dest) };
    transcode(segments, &mut sink)
}
