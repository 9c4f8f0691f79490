//! Access to the memory under test.
//!
//! `MemoryRegion` performs volatile word accesses over a buffer owned by the
//! harness. `BufferHalves` splits any `WordMemory` into the two equal halves
//! used by the comparison tests.

use std::ptr;

use crate::traits::{Word, WordMemory};
#[cfg(feature = "narrow-writes")]
use crate::traits::StoreWidth;

/// A contiguous span of words borrowed from the harness.
///
/// Every access is volatile, so a read always goes to the memory bus
/// instead of being folded into the preceding write.
pub struct MemoryRegion<'a> {
    words: &'a mut [Word],
}

impl<'a> MemoryRegion<'a> {
    /// Wraps a caller-owned buffer.
    pub fn new(words: &'a mut [Word]) -> Self {
        Self { words }
    }

    /// Address of the first word.
    pub fn base_address(&self) -> usize {
        self.words.as_ptr() as usize
    }
}

impl WordMemory for MemoryRegion<'_> {
    fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    fn read(&self, offset: usize) -> Word {
        let cell: *const Word = &self.words[offset];
        // SAFETY: `cell` comes from a bounds-checked reference into the slice.
        unsafe { ptr::read_volatile(cell) }
    }

    #[inline]
    fn write(&mut self, offset: usize, value: Word) {
        let cell: *mut Word = &mut self.words[offset];
        // SAFETY: `cell` comes from a bounds-checked reference into the slice.
        unsafe { ptr::write_volatile(cell, value) }
    }

    fn address(&self, offset: usize) -> Word {
        &self.words[offset] as *const Word as usize
    }

    #[cfg(feature = "narrow-writes")]
    fn write_narrow(&mut self, offset: usize, value: Word, width: StoreWidth) {
        let cell: *mut Word = &mut self.words[offset];
        let bytes = value.to_ne_bytes();
        match width {
            StoreWidth::Bits8 => {
                let lanes = cell.cast::<u8>();
                for (lane, byte) in bytes.iter().enumerate() {
                    // SAFETY: lane < WORD_BYTES stays inside the word at `cell`.
                    unsafe { ptr::write_volatile(lanes.add(lane), *byte) }
                }
            }
            StoreWidth::Bits16 => {
                let lanes = cell.cast::<u16>();
                for (lane, pair) in bytes.chunks_exact(2).enumerate() {
                    let half_word = u16::from_ne_bytes([pair[0], pair[1]]);
                    // SAFETY: a word is at least 2-aligned and holds WORD_BYTES / 2 lanes.
                    unsafe { ptr::write_volatile(lanes.add(lane), half_word) }
                }
            }
        }
    }
}

/// Which half of a `BufferHalves` an access targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    A,
    B,
}

impl Half {
    /// The other half.
    #[cfg(feature = "narrow-writes")]
    pub fn other(self) -> Self {
        match self {
            Half::A => Half::B,
            Half::B => Half::A,
        }
    }
}

/// A region split into two equal, non-overlapping halves.
///
/// Half A covers words `[0, count)` and half B covers `[count, 2 * count)`.
/// A trailing odd word is never touched.
pub struct BufferHalves<'a, M: WordMemory + ?Sized> {
    memory: &'a mut M,
    count: usize,
}

impl<'a, M: WordMemory + ?Sized> BufferHalves<'a, M> {
    /// Splits `memory` in two. The caller guarantees at least two words.
    pub fn split(memory: &'a mut M) -> Self {
        let count = memory.len() / 2;
        debug_assert!(count > 0, "region must hold at least two words");
        Self { memory, count }
    }

    /// Words per half.
    pub fn count(&self) -> usize {
        self.count
    }

    fn offset(&self, half: Half, index: usize) -> usize {
        debug_assert!(index < self.count);
        match half {
            Half::A => index,
            Half::B => self.count + index,
        }
    }

    pub fn read(&self, half: Half, index: usize) -> Word {
        self.memory.read(self.offset(half, index))
    }

    pub fn write(&mut self, half: Half, index: usize, value: Word) {
        let offset = self.offset(half, index);
        self.memory.write(offset, value);
    }

    #[cfg(feature = "narrow-writes")]
    pub fn write_narrow(&mut self, half: Half, index: usize, value: Word, width: StoreWidth) {
        let offset = self.offset(half, index);
        self.memory.write_narrow(offset, value, width);
    }
}
