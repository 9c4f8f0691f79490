//! Statistics tracking for a test run.

use crate::traits::WORD_BYTES;

/// Counters accumulated by the harness over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    bytes_tested: u64,
    tests_completed: u64,
    tests_failed: u64,
}

impl RunStats {
    /// Creates a RunStats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `words` machine words to the bytes tested counter.
    pub fn add_words(&mut self, words: usize) {
        self.bytes_tested += (words * WORD_BYTES) as u64;
    }

    /// Records a finished test and whether it passed.
    pub fn add_test(&mut self, passed: bool) {
        self.tests_completed += 1;
        if !passed {
            self.tests_failed += 1;
        }
    }

    /// Returns the total number of bytes tested.
    pub fn get_bytes(&self) -> u64 {
        self.bytes_tested
    }

    /// Returns the total number of tests completed.
    pub fn get_tests(&self) -> u64 {
        self.tests_completed
    }

    /// Returns the number of tests that reported a fault.
    pub fn get_failures(&self) -> u64 {
        self.tests_failed
    }
}
