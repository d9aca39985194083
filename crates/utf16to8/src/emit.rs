//! Output disciplines the engine is generic over.
//!
//! - [`LengthCounter`]: counts bytes, writes nothing.
//! - [`CheckedWriter`]: writes into a bounded window (a `&mut [u8]` or a raw,
//!   possibly uninitialized region); refuses any sequence that does not fit
//!   whole.
//! - [`UncheckedWriter`]: writes through a raw pointer with no bound checks.
//!
//! Each is a separate type so the engine is monomorphized per discipline and
//! the counting path never touches memory.

use core::{marker::PhantomData, ptr};

/// Raised by a bounded sink when the next emission does not fit. The engine
/// stops at the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Full;

pub(crate) trait Emit {
    /// Emits one complete UTF-8 sequence of `N` bytes (`1..=4`), or nothing.
    fn emit<const N: usize>(&mut self, bytes: [u8; N]) -> Result<(), Full>;

    /// Bulk-copies ASCII bytes. A bounded sink copies the prefix that fits and
    /// then reports [`Full`].
    fn emit_ascii(&mut self, bytes: &[u8]) -> Result<(), Full>;

    /// Bytes emitted so far.
    fn written(&self) -> usize;
}

#[derive(Debug, Default)]
pub(crate) struct LengthCounter {
    len: usize,
}

impl Emit for LengthCounter {
    #[inline]
    fn emit<const N: usize>(&mut self, _bytes: [u8; N]) -> Result<(), Full> {
        self.len += N;
        Ok(())
    }

    #[inline]
    fn emit_ascii(&mut self, bytes: &[u8]) -> Result<(), Full> {
        self.len += bytes.len();
        Ok(())
    }

    fn written(&self) -> usize {
        self.len
    }
}

/// Bounded sink. Writes go through a raw pointer so the window may be
/// uninitialized memory handed over by a host.
#[derive(Debug)]
pub(crate) struct CheckedWriter<'d> {
    dest: *mut u8,
    end: usize,
    pos: usize,
    _dest: PhantomData<&'d mut [u8]>,
}

impl<'d> CheckedWriter<'d> {
    pub(crate) fn new(dest: &'d mut [u8]) -> Self {
        // SAFETY: a live `&mut [u8]` is valid for writes of its length.
        unsafe { Self::from_raw(dest.as_mut_ptr(), dest.len()) }
    }

    /// # Safety
    ///
    /// `dest` must be valid for writes of `end` bytes for `'d` and must not
    /// alias anything read during the transcode. The bytes may be
    /// uninitialized; they are only ever written. With `end == 0` the
    /// pointer is never used.
    pub(crate) unsafe fn from_raw(dest: *mut u8, end: usize) -> Self {
        Self {
            dest,
            end,
            pos: 0,
            _dest: PhantomData,
        }
    }

    #[cfg(feature = "tracing")]
    pub(crate) fn capacity(&self) -> usize {
        self.end
    }
}

impl Emit for CheckedWriter<'_> {
    #[inline]
    fn emit<const N: usize>(&mut self, bytes: [u8; N]) -> Result<(), Full> {
        if N > self.end - self.pos {
            return Err(Full);
        }
        // SAFETY: `pos + N <= end`, inside the window.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.dest.add(self.pos), N);
        }
        self.pos += N;
        Ok(())
    }

    #[inline]
    fn emit_ascii(&mut self, bytes: &[u8]) -> Result<(), Full> {
        let n = bytes.len().min(self.end - self.pos);
        if n > 0 {
            // SAFETY: `pos + n <= end`; `bytes` is source storage, disjoint
            // from the window.
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), self.dest.add(self.pos), n);
            }
            self.pos += n;
        }
        if n < bytes.len() { Err(Full) } else { Ok(()) }
    }

    fn written(&self) -> usize {
        self.pos
    }
}

#[derive(Debug)]
pub(crate) struct UncheckedWriter<'d> {
    dest: *mut u8,
    pos: usize,
    _dest: PhantomData<&'d mut [u8]>,
}

impl UncheckedWriter<'_> {
    /// # Safety
    ///
    /// `dest` must be valid for writes of as many bytes as will be emitted,
    /// and must not alias anything read during the transcode.
    pub(crate) unsafe fn new(dest: *mut u8) -> Self {
        Self {
            dest,
            pos: 0,
            _dest: PhantomData,
        }
    }
}

impl Emit for UncheckedWriter<'_> {
    #[inline]
    fn emit<const N: usize>(&mut self, bytes: [u8; N]) -> Result<(), Full> {
        // SAFETY: the constructor's contract covers every emitted byte.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.dest.add(self.pos), N);
        }
        self.pos += N;
        Ok(())
    }

    #[inline]
    fn emit_ascii(&mut self, bytes: &[u8]) -> Result<(), Full> {
        // SAFETY: as above; `bytes` is borrowed source storage, disjoint from
        // the destination.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.dest.add(self.pos), bytes.len());
        }
        self.pos += bytes.len();
        Ok(())
    }

    fn written(&self) -> usize {
        self.pos
    }
}
