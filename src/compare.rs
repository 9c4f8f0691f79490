//! The comparison protocol shared by every pattern test.
//!
//! Each pass writes half A from one generator and half B from a second,
//! independently built generator of the same pattern, then reads both halves
//! back and compares them word by word. Healthy memory always holds two
//! identical halves; any divergence is a fault in one of them.

use crate::error::MemoryFault;
use crate::memory::{BufferHalves, Half};
use crate::patterns::Pattern;
use crate::traits::{TestResult, Word, WordMemory};
#[cfg(feature = "narrow-writes")]
use crate::patterns::RandomValue;
#[cfg(feature = "narrow-writes")]
use crate::traits::StoreWidth;

/// Attempts per narrow-write test; the halves swap roles between attempts.
#[cfg(feature = "narrow-writes")]
pub const NARROW_ATTEMPTS: usize = 2;

/// Fills one half from `words`.
pub fn write_half<M, I>(halves: &mut BufferHalves<'_, M>, half: Half, words: I)
where
    M: WordMemory + ?Sized,
    I: Iterator<Item = Word>,
{
    let count = halves.count();
    for (index, value) in words.take(count).enumerate() {
        halves.write(half, index, value);
    }
}

/// Writes one pass of `pattern` to both halves, each from its own generator.
pub fn write_halves<M, P>(halves: &mut BufferHalves<'_, M>, pattern: &P, pass: usize)
where
    M: WordMemory + ?Sized,
    P: Pattern,
{
    write_half(halves, Half::A, pattern.pass(pass));
    write_half(halves, Half::B, pattern.pass(pass));
}

/// Compares the halves word by word.
///
/// Reports the first mismatch, with half A's word as `expected` and half B's
/// as `observed`, and counts every mismatching word.
pub fn verify_halves<M>(halves: &BufferHalves<'_, M>) -> TestResult
where
    M: WordMemory + ?Sized,
{
    let mut first: Option<MemoryFault> = None;
    let mut mismatches = 0;
    for index in 0..halves.count() {
        let a = halves.read(Half::A, index);
        let b = halves.read(Half::B, index);
        if a != b {
            mismatches += 1;
            first.get_or_insert(MemoryFault::new(index, a, b));
        }
    }
    match first {
        Some(fault) => Err(MemoryFault { mismatches, ..fault }),
        None => Ok(()),
    }
}

/// Runs every pass of `pattern`, stopping at the first failing pass.
pub fn compare_pattern<M, P>(halves: &mut BufferHalves<'_, M>, pattern: &P) -> TestResult
where
    M: WordMemory + ?Sized,
    P: Pattern,
{
    for pass in 0..pattern.passes() {
        write_halves(halves, pattern, pass);
        verify_halves(&*halves)?;
    }
    Ok(())
}

/// Writes random words to one half with full-word stores and to the other
/// through `width`-bit stores, then compares.
#[cfg(feature = "narrow-writes")]
pub fn compare_narrow<M>(
    halves: &mut BufferHalves<'_, M>,
    seed: u64,
    width: StoreWidth,
) -> TestResult
where
    M: WordMemory + ?Sized,
{
    let count = halves.count();
    for attempt in 0..NARROW_ATTEMPTS {
        let pattern = RandomValue {
            seed: seed.wrapping_add(attempt as u64),
        };
        let wide = if attempt % 2 == 0 { Half::A } else { Half::B };
        write_half(halves, wide, pattern.pass(0));
        for (index, value) in pattern.pass(0).take(count).enumerate() {
            halves.write_narrow(wide.other(), index, value, width);
        }
        verify_halves(&*halves)?;
    }
    Ok(())
}
