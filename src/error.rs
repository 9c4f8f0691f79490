//! Error types for memory testing.
//!
//! `MemoryFault` is the only failure the test engine produces. `MemcheckError`
//! covers everything the harness can fail with.

use crate::traits::Word;
use thiserror::Error;

/// A located memory fault: the first mismatching word of a test.
///
/// For comparison tests `offset` is the word index within each half,
/// `expected` is the word read back from half A and `observed` the word read
/// back from half B. For the stuck-address test `offset` is the word index
/// within the whole region and `expected` the address-derived value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("0x{expected:X} != 0x{observed:X} at offset 0x{offset:X} ({mismatches} mismatching words)")]
pub struct MemoryFault {
    /// Word offset of the first mismatch.
    pub offset: usize,
    /// Value the word should hold.
    pub expected: Word,
    /// Value actually read back.
    pub observed: Word,
    /// Number of mismatching words in the failing pass.
    pub mismatches: usize,
}

impl MemoryFault {
    /// Creates a fault for a single mismatching word.
    pub fn new(offset: usize, expected: Word, observed: Word) -> Self {
        Self {
            offset,
            expected,
            observed,
            mismatches: 1,
        }
    }

    /// Bits that differ between the expected and observed values.
    pub fn flipped_bits(&self) -> Word {
        self.expected ^ self.observed
    }
}

/// Unified error type for memcheck operations.
#[derive(Error, Debug)]
pub enum MemcheckError {
    /// A test detected a memory fault.
    #[error("Memory error: {test} failed in loop {loop_index}: {fault}")]
    Memory {
        test: &'static str,
        loop_index: u64,
        fault: MemoryFault,
    },

    /// Configuration error; the run cannot start.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Installing the interrupt handler failed.
    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}
