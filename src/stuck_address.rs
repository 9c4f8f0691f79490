//! Stuck address line detection.
//!
//! Every word is written with a value derived from its own address, so a
//! word's expected content never matches a neighbour's. When an address
//! line is stuck, two offsets land in the same cell and one of them reads
//! back the other's value.

use crate::error::MemoryFault;
use crate::traits::{TestResult, Word, WordMemory};

/// Write/verify passes; consecutive passes swap each word's polarity.
pub const STUCK_ADDRESS_PASSES: usize = 16;

/// Value written to `offset` during `pass`: the address itself when
/// `pass + offset` is even, its complement otherwise.
pub fn address_value<M: WordMemory + ?Sized>(memory: &M, pass: usize, offset: usize) -> Word {
    let address = memory.address(offset);
    if (pass + offset) % 2 == 0 {
        address
    } else {
        !address
    }
}

/// Runs the stuck-address test over the whole region.
pub fn run<M: WordMemory + ?Sized>(memory: &mut M) -> TestResult {
    let len = memory.len();
    for pass in 0..STUCK_ADDRESS_PASSES {
        for offset in 0..len {
            let value = address_value(&*memory, pass, offset);
            memory.write(offset, value);
        }

        let mut first: Option<MemoryFault> = None;
        let mut mismatches = 0;
        for offset in 0..len {
            let expected = address_value(&*memory, pass, offset);
            let observed = memory.read(offset);
            if observed != expected {
                mismatches += 1;
                first.get_or_insert(MemoryFault::new(offset, expected, observed));
            }
        }
        if let Some(fault) = first {
            return Err(MemoryFault { mismatches, ..fault });
        }
    }
    Ok(())
}
