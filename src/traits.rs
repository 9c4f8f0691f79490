//! Core traits for memory testing.
//!
//! This module defines the native `Word` type and the `WordMemory` trait
//! through which every test reaches the memory under test. The production
//! implementation is `memory::MemoryRegion`; tests substitute models of
//! faulty memory.

use crate::error::MemoryFault;

/// The native machine word tested by every pattern.
pub type Word = usize;

/// Width of the word in bits.
pub const WORD_BITS: usize = Word::BITS as usize;

/// Size of the word in bytes.
pub const WORD_BYTES: usize = std::mem::size_of::<Word>();

/// Outcome of a single test: pass, or the first located fault.
pub type TestResult = Result<(), MemoryFault>;

/// Store width used by the narrow-write tests.
#[cfg(feature = "narrow-writes")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWidth {
    Bits8,
    Bits16,
}

/// Word-granular access to the memory under test.
///
/// Offsets are in words. Implementations must not cache values: every
/// `read` observes what the storage actually holds.
pub trait WordMemory {
    /// Number of words in the region.
    fn len(&self) -> usize;

    /// Reads the word at `offset`.
    fn read(&self, offset: usize) -> Word;

    /// Writes `value` to the word at `offset`.
    fn write(&mut self, offset: usize, value: Word);

    /// The address-derived value for `offset`.
    ///
    /// Used by the stuck-address test. Models that have no real address
    /// use the offset itself.
    fn address(&self, offset: usize) -> Word {
        offset
    }

    /// Writes `value` to the word at `offset` through stores narrower
    /// than a word.
    #[cfg(feature = "narrow-writes")]
    fn write_narrow(&mut self, offset: usize, value: Word, width: StoreWidth) {
        let _ = width;
        self.write(offset, value);
    }
}
