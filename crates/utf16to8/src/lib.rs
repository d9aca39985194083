//! Segment-aware UTF-16 to UTF-8 transcoding.
//!
//! Host runtimes often store strings as a chain of runs, some one-byte ASCII
//! and some two-byte UTF-16. This crate encodes such strings to UTF-8 without
//! flattening them first, in one of three ways:
//!
//! - compute the exact UTF-8 length ([`utf8_len`], [`Utf8Writer::len`]);
//! - write into a bounded buffer, stopping on a character boundary when it
//!   fills up ([`encode_utf8_into`], [`Utf8Writer::write`]);
//! - write into a buffer the caller has already sized, without bound checks
//!   ([`encode_utf8_unchecked`], [`Utf8Writer::write_unchecked`]).
//!
//! Unpaired surrogates, including a lead at the end of one run whose trail
//! never arrives, are replaced with U+FFFD. Transcoding never fails.
//!
//! ```rust
//! use utf16to8::{Segment, Utf8Writer};
//!
//! let wide = [0x20AC, 0xD83D];
//! let tail = [0xDE00];
//! let segments = [
//!     Segment::ascii(b"cost: ").unwrap(),
//!     Segment::wide(&wide),
//!     Segment::wide(&tail),
//! ];
//!
//! let writer = Utf8Writer::new(&segments[..]);
//! assert_eq!(writer.len(), 13);
//! assert_eq!(writer.to_utf8_string(), "cost: \u{20AC}\u{1F600}");
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod emit;
mod engine;
mod error;
mod segment;
mod segmented;
mod writer;

#[cfg(test)]
mod tests;

#[cfg(any(test, feature = "fuzzing"))]
pub mod testing;

pub use engine::{REPLACEMENT, encode_utf8_into, encode_utf8_unchecked, utf8_len};
pub use error::{SegmentError, WriteError};
pub use segment::{Segment, SegmentKind, SliceSegments, Utf16Text};
pub use segmented::{Runs, SegmentedString};
pub use writer::Utf8Writer;
