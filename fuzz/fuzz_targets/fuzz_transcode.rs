#![no_main]
use std::cell::RefCell;

use arbitrary::Unstructured;
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use utf16to8::{
    Utf8Writer,
    testing::{partition, reference_utf8},
};

const HEADER: usize = 6; // 4-byte split seed + 2-byte window size

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Every tenth run (or when the input is too short for a header) builds a
/// fresh input whose units are drawn mostly from the surrogate ranges, which
/// plain byte mutation rarely hits in pairs.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size < HEADER {
        return fuzzer_mutate(data, size, max_size);
    }
    if size < HEADER || seed.is_multiple_of(10) {
        data[..4].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));
        data[4..6].copy_from_slice(&with_rng(|rng| (rng.next_u32() as u16).to_le_bytes()));

        let entropy: Vec<u8> = with_rng(|rng| (0..max_size).map(|_| rng.random::<u8>()).collect());
        let mut u = Unstructured::new(&entropy);
        let mut len = HEADER;
        while len + 2 <= max_size {
            let Ok(unit) = interesting_unit(&mut u) else {
                break;
            };
            data[len..len + 2].copy_from_slice(&unit.to_le_bytes());
            len += 2;
            if with_rng(|rng| rng.random_ratio(1, 16)) {
                break;
            }
        }
        len
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn interesting_unit(u: &mut Unstructured<'_>) -> arbitrary::Result<u16> {
    Ok(match u.choose_index(6)? {
        0 => u.int_in_range(0x00..=0x7F)?,
        1 => u.int_in_range(0x80..=0x7FF)?,
        2 => u.int_in_range(0x800..=0xFFFF)?,
        3 | 4 => u.int_in_range(0xD800..=0xDBFF)?,
        _ => u.int_in_range(0xDC00..=0xDFFF)?,
    })
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

fn transcode(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let split_seed = u64::from(u32::from_le_bytes(data[0..4].try_into().unwrap()));
    let window = usize::from(u16::from_le_bytes(data[4..6].try_into().unwrap()));
    let units: Vec<u16> = data[HEADER..]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let mut rng = SmallRng::seed_from_u64(split_seed);
    let splits: Vec<usize> = (0..units.len() / 2 + 1)
        .map(|_| rng.random_range(0..=units.len() + 1))
        .collect();

    let expected = reference_utf8(&units);
    let text = partition(&units, &splits);
    let segmented = Utf8Writer::new(&text);
    let flat = Utf8Writer::new(&units[..]);

    assert_eq!(segmented.len(), expected.len());
    assert_eq!(flat.len(), expected.len());
    assert_eq!(segmented.to_utf8_vec(), expected.as_bytes());

    let mut buf = vec![0u8; window];
    let n = segmented.write(&mut buf);
    assert!(n <= window);
    assert_eq!(&buf[..n], &expected.as_bytes()[..n]);
    assert!(expected.is_char_boundary(n));
    if window >= expected.len() {
        assert_eq!(n, expected.len());
    } else {
        assert!(window - n < 4, "stopped early: {n} of {window}");
    }
    assert_eq!(flat.write(&mut buf), n);
}

fuzz_target!(|data: &[u8]| transcode(data));
