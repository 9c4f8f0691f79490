//! Memory models with injected faults, shared by the unit tests.

use crate::traits::{Word, WordMemory};

/// Plain healthy cells.
pub struct Cells {
    cells: Vec<Word>,
}

impl Cells {
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![0; len],
        }
    }
}

impl WordMemory for Cells {
    fn len(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, offset: usize) -> Word {
        self.cells[offset]
    }

    fn write(&mut self, offset: usize, value: Word) {
        self.cells[offset] = value;
    }
}

/// Every read of one word comes back with `mask` flipped.
pub struct FlippedBit {
    cells: Vec<Word>,
    offset: usize,
    mask: Word,
}

impl FlippedBit {
    pub fn new(len: usize, offset: usize, mask: Word) -> Self {
        Self {
            cells: vec![0; len],
            offset,
            mask,
        }
    }
}

impl WordMemory for FlippedBit {
    fn len(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, offset: usize) -> Word {
        if offset == self.offset {
            self.cells[offset] ^ self.mask
        } else {
            self.cells[offset]
        }
    }

    fn write(&mut self, offset: usize, value: Word) {
        self.cells[offset] = value;
    }
}

/// Address decoding that routes some offsets to another cell.
pub struct Aliased {
    cells: Vec<Word>,
    route: Vec<usize>,
}

impl Aliased {
    /// `from` and `to` share the cell at `to`.
    pub fn pair(len: usize, from: usize, to: usize) -> Self {
        let route = (0..len).map(|i| if i == from { to } else { i }).collect();
        Self {
            cells: vec![0; len],
            route,
        }
    }

    /// Address bit `bit` stuck low across the whole region.
    pub fn stuck_low(len: usize, bit: u32) -> Self {
        let route = (0..len).map(|i| i & !(1 << bit)).collect();
        Self {
            cells: vec![0; len],
            route,
        }
    }
}

impl WordMemory for Aliased {
    fn len(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, offset: usize) -> Word {
        self.cells[self.route[offset]]
    }

    fn write(&mut self, offset: usize, value: Word) {
        self.cells[self.route[offset]] = value;
    }
}
