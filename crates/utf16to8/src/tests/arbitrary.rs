use alloc::{boxed::Box, vec::Vec};

use quickcheck::{Arbitrary, Gen};

/// UTF-16 input biased towards the interesting unit classes: plenty of
/// surrogates (paired and not) mixed with one-, two- and three-byte units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Units(pub Vec<u16>);

/// Like [`Units`] but only ever well-formed: every lead is followed by a
/// trail and no trail stands alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidUnits(pub Vec<u16>);

fn unit_in(g: &mut Gen, lo: u16, hi: u16) -> u16 {
    lo + u16::arbitrary(g) % (hi - lo + 1)
}

fn scalar_units(g: &mut Gen, out: &mut Vec<u16>) {
    match usize::arbitrary(g) % 5 {
        0 | 1 => out.push(unit_in(g, 0x00, 0x7F)),
        2 => out.push(unit_in(g, 0x80, 0x7FF)),
        3 => out.push(if bool::arbitrary(g) {
            unit_in(g, 0x800, 0xD7FF)
        } else {
            unit_in(g, 0xE000, 0xFFFF)
        }),
        _ => {
            out.push(unit_in(g, 0xD800, 0xDBFF));
            out.push(unit_in(g, 0xDC00, 0xDFFF));
        }
    }
}

impl Arbitrary for Units {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % (g.size() + 1);
        let mut out = Vec::with_capacity(n * 2);
        for _ in 0..n {
            match usize::arbitrary(g) % 8 {
                0 => out.push(unit_in(g, 0xD800, 0xDBFF)),
                1 => out.push(unit_in(g, 0xDC00, 0xDFFF)),
                _ => scalar_units(g, &mut out),
            }
        }
        Units(out)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Units))
    }
}

impl Arbitrary for ValidUnits {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % (g.size() + 1);
        let mut out = Vec::with_capacity(n * 2);
        for _ in 0..n {
            scalar_units(g, &mut out);
        }
        ValidUnits(out)
    }
}

pub(crate) fn test_count() -> u64 {
    #[cfg(not(any(miri, feature = "test-fast")))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(any(miri, feature = "test-fast"))]
    let tests = 10;
    tests
}
