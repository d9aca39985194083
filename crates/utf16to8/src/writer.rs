//! `Utf8Writer`: the facade an embedding host calls to marshal one UTF-16
//! string into UTF-8.

use alloc::{string::String, vec, vec::Vec};
use core::{cell::Cell, fmt};

use crate::{
    emit::{CheckedWriter, LengthCounter, UncheckedWriter},
    engine::transcode,
    error::WriteError,
    segment::Utf16Text,
};

/// Borrows a UTF-16 string and writes it out as UTF-8.
///
/// The UTF-8 length is computed on first use and cached; the string must not
/// change while the writer exists. The cache is a [`Cell`], so a writer cannot
/// be shared across threads without outside synchronization.
///
/// ```rust
/// use utf16to8::Utf8Writer;
///
/// let units: Vec<u16> = "h\u{e9}llo".encode_utf16().collect();
/// let writer = Utf8Writer::new(&units[..]);
/// assert_eq!(writer.len(), 6);
///
/// let mut buf = [0u8; 2];
/// // 'h' fits, 'é' needs two more bytes than remain.
/// assert_eq!(writer.write(&mut buf), 1);
/// assert_eq!(writer.write_str(&mut [0u8; 16]), "h\u{e9}llo");
/// ```
pub struct Utf8Writer<'s, T: Utf16Text + ?Sized> {
    text: &'s T,
    utf8_len: Cell<Option<usize>>,
}

impl<'s, T: Utf16Text + ?Sized> Utf8Writer<'s, T> {
    /// Wraps `text`. Nothing is computed until first use.
    #[must_use]
    pub fn new(text: &'s T) -> Self {
        Self {
            text,
            utf8_len: Cell::new(None),
        }
    }

    /// The wrapped string.
    #[must_use]
    pub fn text(&self) -> &'s T {
        self.text
    }

    /// UTF-8 length in bytes, including three bytes per replaced surrogate.
    ///
    /// Computed once; later calls return the cached value.
    #[must_use]
    pub fn len(&self) -> usize {
        if let Some(len) = self.utf8_len.get() {
            return len;
        }
        let len = if self.text.known_ascii() {
            self.text.len_utf16()
        } else {
            transcode(self.text.segments(), &mut LengthCounter::default())
        };
        #[cfg(feature = "tracing")]
        tracing::trace!(
            utf8_len = len,
            utf16_len = self.text.len_utf16(),
            ascii_fast_path = self.text.known_ascii(),
            "cached utf-8 length"
        );
        self.utf8_len.set(Some(len));
        len
    }

    /// Whether the encoding is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes as much of the encoding as fits in `dest` and returns the bytes
    /// written.
    ///
    /// Multi-byte sequences are written whole or not at all, so a short write
    /// always ends on a character boundary. A return value below
    /// [`len`](Self::len) means the output was truncated.
    ///
    /// With the `tracing` feature, a write also fills the length cache (to
    /// report short writes), so the first call costs an extra length pass.
    pub fn write(&self, dest: &mut [u8]) -> usize {
        self.write_checked(CheckedWriter::new(dest))
    }

    fn write_checked(&self, mut sink: CheckedWriter<'_>) -> usize {
        #[cfg(feature = "tracing")]
        let window = sink.capacity();
        let written = transcode(self.text.segments(), &mut sink);
        #[cfg(feature = "tracing")]
        {
            let required = self.len();
            if written < required {
                tracing::debug!(written, window, required, "short utf-8 write");
            }
        }
        written
    }

    /// Like [`write`](Self::write), returning the written prefix as text.
    pub fn write_str<'d>(&self, dest: &'d mut [u8]) -> &'d str {
        let n = self.write(dest);
        let out = &dest[..n];
        debug_assert!(core::str::from_utf8(out).is_ok());
        // SAFETY: the engine only emits complete UTF-8 sequences, and repairs
        // every unpaired surrogate with U+FFFD.
        unsafe { core::str::from_utf8_unchecked(out) }
    }

    /// Writes the complete encoding into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Truncated`] if `dest` is shorter than
    /// [`len`](Self::len). The prefix that fit has still been written.
    pub fn write_all(&self, dest: &mut [u8]) -> Result<usize, WriteError> {
        let written = self.write(dest);
        let required = self.len();
        if written < required {
            return Err(WriteError::Truncated { written, required });
        }
        Ok(written)
    }

    /// Writes the complete encoding without bound checks and returns its
    /// length.
    ///
    /// # Safety
    ///
    /// `dest` must be valid for writes of [`len`](Self::len) bytes and must
    /// not overlap the wrapped string's storage.
    pub unsafe fn write_unchecked(&self, dest: *mut u8) -> usize {
        // SAFETY: forwarded to the caller.
        let mut sink = unsafe { UncheckedWriter::new(dest) };
        transcode(self.text.segments(), &mut sink)
    }

    /// Host-facing entry point with a signed size. A non-negative `size`
    /// bounds the write like [`write`](Self::write); a negative `size` asks
    /// for an unchecked write of the whole encoding.
    ///
    /// The destination is only written, never read, so it may be freshly
    /// allocated, uninitialized memory.
    ///
    /// # Safety
    ///
    /// If `size >= 0`, `dest` must be valid for writes of `size` bytes (with
    /// `size == 0` it is never used and may be null). Otherwise the contract
    /// of [`write_unchecked`](Self::write_unchecked) applies. In both cases
    /// `dest` must not overlap the wrapped string.
    pub unsafe fn write_raw(&self, dest: *mut u8, size: isize) -> usize {
        match usize::try_from(size) {
            Ok(size) => {
                // SAFETY: the caller guarantees `size` writable bytes.
                let sink = unsafe { CheckedWriter::from_raw(dest, size) };
                self.write_checked(sink)
            }
            // SAFETY: forwarded to the caller.
            Err(_) => unsafe { self.write_unchecked(dest) },
        }
    }

    /// Encodes into a freshly allocated buffer of exactly [`len`](Self::len)
    /// bytes.
    #[must_use]
    pub fn to_utf8_vec(&self) -> Vec<u8> {
        let mut out = vec![0; self.len()];
        let written = self.write(&mut out);
        debug_assert_eq!(written, out.len());
        out
    }

    /// Encodes into an owned `String`.
    #[must_use]
    pub fn to_utf8_string(&self) -> String {
        let bytes = self.to_utf8_vec();
        debug_assert!(core::str::from_utf8(&bytes).is_ok());
        // SAFETY: see `write_str`; the buffer holds the complete encoding.
        unsafe { String::from_utf8_unchecked(bytes) }
    }
}

impl<T: Utf16Text + ?Sized> Clone for Utf8Writer<'_, T> {
    fn clone(&self) -> Self {
        Self {
            text: self.text,
            utf8_len: self.utf8_len.clone(),
        }
    }
}

impl<T: Utf16Text + ?Sized> fmt::Debug for Utf8Writer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utf8Writer")
            .field("utf16_len", &self.text.len_utf16())
            .field("utf8_len", &self.utf8_len.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, vec, vec::Vec};

    use super::*;
    use crate::{Segment, SegmentedString};

    /// Counts how often the engine is asked for segments.
    struct Counting<'a> {
        units: &'a [u16],
        calls: Cell<usize>,
    }

    impl Utf16Text for Counting<'_> {
        type Segments<'b>
            = core::iter::Once<Segment<'b>>
        where
            Self: 'b;

        fn segments(&self) -> Self::Segments<'_> {
            self.calls.set(self.calls.get() + 1);
            core::iter::once(Segment::wide(self.units))
        }

        fn len_utf16(&self) -> usize {
            self.units.len()
        }
    }

    #[test]
    fn length_is_computed_once() {
        let text = Counting {
            units: &[0x20AC, 0x41],
            calls: Cell::new(0),
        };
        let w = Utf8Writer::new(&text);
        assert_eq!(w.len(), 4);
        assert_eq!(w.len(), 4);
        assert_eq!(text.calls.get(), 1);
    }

    #[test]
    fn known_ascii_skips_the_engine() {
        let text = SegmentedString::from("plain ascii");
        let w = Utf8Writer::new(&text);
        assert!(text.known_ascii());
        assert_eq!(w.len(), 11);
        assert_eq!(w.to_utf8_vec(), b"plain ascii");
    }

    #[test]
    fn write_raw_dispatches_on_sign() {
        let units = [0x41, 0xD83D, 0xDE00];
        let w = Utf8Writer::new(&units[..]);

        let mut small = [0u8; 3];
        // SAFETY: `small` has room for 3 bytes.
        assert_eq!(unsafe { w.write_raw(small.as_mut_ptr(), 3) }, 1);

        let mut full = vec![0u8; w.len()];
        // SAFETY: `full` holds `len()` bytes.
        assert_eq!(unsafe { w.write_raw(full.as_mut_ptr(), -1) }, 5);
        assert_eq!(full, [0x41, 0xF0, 0x9F, 0x98, 0x80]);

        // SAFETY: a zero-sized window is never written.
        assert_eq!(unsafe { w.write_raw(core::ptr::null_mut(), 0) }, 0);
    }

    #[test]
    fn write_raw_into_uninitialized_allocation() {
        let units: Vec<u16> = "h\u{e9}\u{1F600}".encode_utf16().collect();
        let w = Utf8Writer::new(&units[..]);
        let len = w.len();

        let mut full: Vec<u8> = Vec::with_capacity(len);
        let size = isize::try_from(len).unwrap();
        // SAFETY: the allocation has room for `len` bytes; none are read.
        let n = unsafe { w.write_raw(full.as_mut_ptr(), size) };
        // SAFETY: the first `n` bytes were written.
        unsafe { full.set_len(n) };
        assert_eq!(full, "h\u{e9}\u{1F600}".as_bytes());

        let mut short: Vec<u8> = Vec::with_capacity(6);
        // SAFETY: as above, with a six-byte window.
        let n = unsafe { w.write_raw(short.as_mut_ptr(), 6) };
        // SAFETY: the first `n` bytes were written.
        unsafe { short.set_len(n) };
        assert_eq!(short, "h\u{e9}".as_bytes());
    }

    #[test]
    fn write_all_reports_truncation() {
        let units = [0x00E9, 0x00E9];
        let w = Utf8Writer::new(&units[..]);
        let mut buf = [0u8; 3];
        assert_eq!(
            w.write_all(&mut buf),
            Err(WriteError::Truncated {
                written: 2,
                required: 4
            })
        );
        let mut buf = [0u8; 4];
        assert_eq!(w.write_all(&mut buf), Ok(4));
    }

    #[test]
    fn write_str_returns_valid_prefix() {
        let units: Vec<u16> = "a\u{1F600}b".encode_utf16().collect();
        let w = Utf8Writer::new(&units[..]);
        let mut buf = [0u8; 4];
        assert_eq!(w.write_str(&mut buf), "a");
        let mut buf = [0u8; 5];
        assert_eq!(w.write_str(&mut buf), "a\u{1F600}");
    }

    #[test]
    fn lone_surrogates_become_replacement_characters() {
        let units = [0xDC00, 0x41, 0xD800];
        let w = Utf8Writer::new(&units[..]);
        assert_eq!(w.to_utf8_string(), "\u{FFFD}A\u{FFFD}");
        assert_eq!(w.len(), 7);
    }

    #[test]
    fn debug_shows_cache_state() {
        let units = [0x41_u16];
        let w = Utf8Writer::new(&units[..]);
        assert_eq!(
            format!("{w:?}"),
            "Utf8Writer { utf16_len: 1, utf8_len: None, .. }"
        );
        let _ = w.len();
        assert_eq!(
            format!("{w:?}"),
            "Utf8Writer { utf16_len: 1, utf8_len: Some(1), .. }"
        );
    }

    #[cfg(feature = "tracing")]
    mod tracing_events {
        use alloc::{
            format,
            string::{String, ToString},
            vec::Vec,
        };
        use std::sync::{Arc, Mutex};

        use tracing::{Level, Subscriber};
        use tracing_subscriber::{
            Layer,
            layer::{Context, SubscriberExt},
        };

        use super::*;

        #[derive(Debug)]
        struct Captured {
            level: Level,
            message: String,
            fields: Vec<(&'static str, u64)>,
        }

        impl Captured {
            fn field(&self, name: &str) -> Option<u64> {
                self.fields.iter().find(|(n, _)| *n == name).map(|&(_, v)| v)
            }
        }

        struct Capture {
            events: Arc<Mutex<Vec<Captured>>>,
        }

        impl<S: Subscriber> Layer<S> for Capture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                struct Visitor {
                    message: String,
                    fields: Vec<(&'static str, u64)>,
                }
                impl tracing::field::Visit for Visitor {
                    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
                        self.fields.push((field.name(), value));
                    }

                    fn record_debug(
                        &mut self,
                        field: &tracing::field::Field,
                        value: &dyn core::fmt::Debug,
                    ) {
                        if field.name() == "message" {
                            self.message = format!("{value:?}").trim_matches('"').to_string();
                        }
                    }
                }
                let mut v = Visitor {
                    message: String::new(),
                    fields: Vec::new(),
                };
                event.record(&mut v);
                self.events.lock().unwrap().push(Captured {
                    level: *event.metadata().level(),
                    message: v.message,
                    fields: v.fields,
                });
            }
        }

        #[test]
        fn cache_fill_and_short_write_are_traced() {
            let events = Arc::new(Mutex::new(Vec::new()));
            let subscriber = tracing_subscriber::registry().with(Capture {
                events: Arc::clone(&events),
            });
            let _guard = tracing::subscriber::set_default(subscriber);

            let units = [0x41, 0x20AC];
            let w = Utf8Writer::new(&units[..]);
            let mut small = [0u8; 2];
            assert_eq!(w.write(&mut small), 1);
            // Cached now: no second fill event.
            assert_eq!(w.len(), 4);
            // A complete write is not reported.
            let mut full = [0u8; 4];
            assert_eq!(w.write(&mut full), 4);

            let events = events.lock().unwrap();
            assert_eq!(events.len(), 2, "{events:?}");

            let fill = &events[0];
            assert_eq!(fill.level, Level::TRACE);
            assert_eq!(fill.message, "cached utf-8 length");
            assert_eq!(fill.field("utf8_len"), Some(4));
            assert_eq!(fill.field("utf16_len"), Some(2));

            let short = &events[1];
            assert_eq!(short.level, Level::DEBUG);
            assert_eq!(short.message, "short utf-8 write");
            assert_eq!(short.field("written"), Some(1));
            assert_eq!(short.field("window"), Some(2));
            assert_eq!(short.field("required"), Some(4));
        }
    }
}
