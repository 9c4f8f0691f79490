//! The fixed, ordered catalog of comparison tests.
//!
//! Every test is a `TestKind` variant; `CATALOG` lists them in reporting
//! order. The stuck-address test is not part of the catalog because it always
//! runs first, over the whole region.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::compare::compare_pattern;
#[cfg(feature = "narrow-writes")]
use crate::compare::compare_narrow;
use crate::memory::BufferHalves;
use crate::patterns::{
    BitFlip, BitSpread, BlockSequential, Checkerboard, RandomValue, SequentialIncrement, SolidBits,
    Transform, Transformed, WalkingOnes, WalkingZeroes,
};
#[cfg(feature = "narrow-writes")]
use crate::traits::StoreWidth;
use crate::traits::{TestResult, WordMemory};

/// A comparison test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestKind {
    RandomValue,
    CompareXor,
    CompareSub,
    CompareMul,
    CompareDiv,
    CompareOr,
    CompareAnd,
    SequentialIncrement,
    SolidBits,
    BlockSequential,
    Checkerboard,
    BitSpread,
    BitFlip,
    WalkingOnes,
    WalkingZeroes,
    #[cfg(feature = "narrow-writes")]
    Writes8Bit,
    #[cfg(feature = "narrow-writes")]
    Writes16Bit,
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestDescriptor {
    pub kind: TestKind,
    /// Human-readable name used in reports.
    pub name: &'static str,
    /// Identifier accepted on the command line.
    pub id: &'static str,
}

impl TestDescriptor {
    const fn of(kind: TestKind) -> Self {
        Self {
            kind,
            name: kind.name(),
            id: kind.id(),
        }
    }

    /// Runs this entry against `halves`.
    pub fn run<M: WordMemory + ?Sized>(
        &self,
        halves: &mut BufferHalves<'_, M>,
        seed: u64,
    ) -> TestResult {
        self.kind.run(halves, seed)
    }
}

/// Every comparison test, in the order they run and are reported.
pub static CATALOG: &[TestDescriptor] = &[
    TestDescriptor::of(TestKind::RandomValue),
    TestDescriptor::of(TestKind::CompareXor),
    TestDescriptor::of(TestKind::CompareSub),
    TestDescriptor::of(TestKind::CompareMul),
    TestDescriptor::of(TestKind::CompareDiv),
    TestDescriptor::of(TestKind::CompareOr),
    TestDescriptor::of(TestKind::CompareAnd),
    TestDescriptor::of(TestKind::SequentialIncrement),
    TestDescriptor::of(TestKind::SolidBits),
    TestDescriptor::of(TestKind::BlockSequential),
    TestDescriptor::of(TestKind::Checkerboard),
    TestDescriptor::of(TestKind::BitSpread),
    TestDescriptor::of(TestKind::BitFlip),
    TestDescriptor::of(TestKind::WalkingOnes),
    TestDescriptor::of(TestKind::WalkingZeroes),
    #[cfg(feature = "narrow-writes")]
    TestDescriptor::of(TestKind::Writes8Bit),
    #[cfg(feature = "narrow-writes")]
    TestDescriptor::of(TestKind::Writes16Bit),
];

impl TestKind {
    /// Returns all tests in catalog order.
    pub fn all() -> Vec<Self> {
        CATALOG.iter().map(|descriptor| descriptor.kind).collect()
    }

    /// Returns the human-readable name of this test.
    pub const fn name(self) -> &'static str {
        match self {
            Self::RandomValue => "Random Value",
            Self::CompareXor => "Compare XOR",
            Self::CompareSub => "Compare SUB",
            Self::CompareMul => "Compare MUL",
            Self::CompareDiv => "Compare DIV",
            Self::CompareOr => "Compare OR",
            Self::CompareAnd => "Compare AND",
            Self::SequentialIncrement => "Sequential Increment",
            Self::SolidBits => "Solid Bits",
            Self::BlockSequential => "Block Sequential",
            Self::Checkerboard => "Checkerboard",
            Self::BitSpread => "Bit Spread",
            Self::BitFlip => "Bit Flip",
            Self::WalkingOnes => "Walking Ones",
            Self::WalkingZeroes => "Walking Zeroes",
            #[cfg(feature = "narrow-writes")]
            Self::Writes8Bit => "8-bit Writes",
            #[cfg(feature = "narrow-writes")]
            Self::Writes16Bit => "16-bit Writes",
        }
    }

    /// Returns the command-line identifier of this test.
    pub const fn id(self) -> &'static str {
        match self {
            Self::RandomValue => "random-value",
            Self::CompareXor => "compare-xor",
            Self::CompareSub => "compare-sub",
            Self::CompareMul => "compare-mul",
            Self::CompareDiv => "compare-div",
            Self::CompareOr => "compare-or",
            Self::CompareAnd => "compare-and",
            Self::SequentialIncrement => "sequential-increment",
            Self::SolidBits => "solid-bits",
            Self::BlockSequential => "block-sequential",
            Self::Checkerboard => "checkerboard",
            Self::BitSpread => "bit-spread",
            Self::BitFlip => "bit-flip",
            Self::WalkingOnes => "walking-ones",
            Self::WalkingZeroes => "walking-zeroes",
            #[cfg(feature = "narrow-writes")]
            Self::Writes8Bit => "8bit-writes",
            #[cfg(feature = "narrow-writes")]
            Self::Writes16Bit => "16bit-writes",
        }
    }

    /// Position in the catalog; used to derive per-test seeds.
    pub fn index(self) -> usize {
        CATALOG
            .iter()
            .position(|descriptor| descriptor.kind == self)
            .unwrap_or_default()
    }

    /// Runs this test against `halves`.
    ///
    /// `seed` drives every random stream the test uses; the same seed on
    /// healthy memory always yields the same contents.
    pub fn run<M: WordMemory + ?Sized>(
        self,
        halves: &mut BufferHalves<'_, M>,
        seed: u64,
    ) -> TestResult {
        match self {
            Self::RandomValue => compare_pattern(halves, &RandomValue { seed }),
            Self::CompareXor => compare_transformed(halves, seed, Transform::Xor),
            Self::CompareSub => compare_transformed(halves, seed, Transform::Sub),
            Self::CompareMul => compare_transformed(halves, seed, Transform::Mul),
            Self::CompareDiv => compare_transformed(halves, seed, Transform::Div),
            Self::CompareOr => compare_transformed(halves, seed, Transform::Or),
            Self::CompareAnd => compare_transformed(halves, seed, Transform::And),
            Self::SequentialIncrement => compare_pattern(halves, &SequentialIncrement { seed }),
            Self::SolidBits => compare_pattern(halves, &SolidBits),
            Self::BlockSequential => compare_pattern(halves, &BlockSequential),
            Self::Checkerboard => compare_pattern(halves, &Checkerboard),
            Self::BitSpread => compare_pattern(halves, &BitSpread),
            Self::BitFlip => compare_pattern(halves, &BitFlip),
            Self::WalkingOnes => compare_pattern(halves, &WalkingOnes),
            Self::WalkingZeroes => compare_pattern(halves, &WalkingZeroes),
            #[cfg(feature = "narrow-writes")]
            Self::Writes8Bit => compare_narrow(halves, seed, StoreWidth::Bits8),
            #[cfg(feature = "narrow-writes")]
            Self::Writes16Bit => compare_narrow(halves, seed, StoreWidth::Bits16),
        }
    }
}

/// Random values combined with a second random stream seeded from `!seed`.
fn compare_transformed<M: WordMemory + ?Sized>(
    halves: &mut BufferHalves<'_, M>,
    seed: u64,
    transform: Transform,
) -> TestResult {
    let pattern = Transformed {
        values: RandomValue { seed },
        transform,
        operand_seed: !seed,
    };
    compare_pattern(halves, &pattern)
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TestKind {
    type Err = String;

    /// Accepts either the identifier (`walking-ones`) or the name
    /// (`Walking Ones`), ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        CATALOG
            .iter()
            .find(|descriptor| {
                descriptor.id.eq_ignore_ascii_case(s) || descriptor.name.eq_ignore_ascii_case(s)
            })
            .map(|descriptor| descriptor.kind)
            .ok_or_else(|| format!("unknown test '{s}' (use --list-tests to see available tests)"))
    }
}

/// The set of enabled catalog tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSelection {
    enabled: BTreeSet<TestKind>,
}

impl TestSelection {
    /// Every catalog test.
    pub fn all() -> Self {
        Self::only(TestKind::all())
    }

    /// Exactly the given tests.
    pub fn only(kinds: impl IntoIterator<Item = TestKind>) -> Self {
        Self {
            enabled: kinds.into_iter().collect(),
        }
    }

    pub fn contains(&self, kind: TestKind) -> bool {
        self.enabled.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Enabled entries in catalog order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static TestDescriptor> + '_ {
        CATALOG
            .iter()
            .filter(move |descriptor| self.contains(descriptor.kind))
    }
}

impl Default for TestSelection {
    fn default() -> Self {
        Self::all()
    }
}
