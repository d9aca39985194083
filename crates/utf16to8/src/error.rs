use thiserror::Error;

/// Rejected input when building a [`Segment`](crate::Segment) or a
/// [`SegmentedString`](crate::SegmentedString).
///
/// Transcoding itself never fails; only the ASCII storage invariant is checked
/// up front, because ASCII runs are copied to the output verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// A byte above `0x7F` was offered as part of an ASCII run.
    #[error("byte {byte:#04x} at index {index} is not ASCII")]
    NonAscii {
        /// Offset of the offending byte within the run.
        index: usize,
        /// The offending byte.
        byte: u8,
    },
}

/// Returned by [`Utf8Writer::write_all`](crate::Utf8Writer::write_all) when
/// the destination cannot hold the complete encoding.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// The window was too small; `written` bytes of complete sequences were
    /// copied out of `required`.
    #[error("destination truncated: wrote {written} of {required} bytes")]
    Truncated {
        /// Bytes actually written, always ending on a sequence boundary.
        written: usize,
        /// Full UTF-8 length of the source string.
        required: usize,
    },
}
