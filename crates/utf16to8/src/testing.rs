//! Helpers shared by the property tests and the fuzz target.
//!
//! Only compiled for tests and under the `fuzzing` feature.
#![allow(clippy::cast_possible_truncation, missing_docs)]

use alloc::{string::String, vec::Vec};

use crate::segmented::SegmentedString;

/// Decodes `units` with the standard library, replacing every error with
/// U+FFFD. This is the oracle the engine must agree with.
#[must_use]
pub fn reference_utf8(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Splits `units` into runs whose sizes are derived from `splits`.
///
/// Each split picks a run length in `0..=remaining` (so empty runs occur) and
/// its low bit asks for an ASCII run, honoured when every unit in the run is
/// ASCII. Whatever is left after the last split becomes the final run.
#[must_use]
pub fn partition(units: &[u16], splits: &[usize]) -> SegmentedString {
    let mut out = SegmentedString::new();
    let mut rest = units;
    for &s in splits {
        let size = s % (rest.len() + 1);
        let (run, tail) = rest.split_at(size);
        push_run(&mut out, run, s & 1 == 1);
        rest = tail;
    }
    push_run(&mut out, rest, true);
    out
}

fn push_run(out: &mut SegmentedString, run: &[u16], prefer_ascii: bool) {
    if prefer_ascii && run.iter().all(|&u| u < 0x80) {
        let bytes: Vec<u8> = run.iter().map(|&u| u as u8).collect();
        if out.push_ascii(&bytes).is_ok() {
            return;
        }
    }
    out.push_wide(run);
}
