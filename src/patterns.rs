//! Test pattern definitions for memory testing.
//!
//! A pattern generator is an infinite iterator of words. A `Pattern` groups
//! one generator per pass: `pass(p)` always builds a fresh generator, so two
//! calls give two independent, identical sequences. The comparison protocol
//! relies on that to fill both buffer halves without sharing state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::traits::{Word, WORD_BITS};

/// Every bit set.
pub const ONE_BITS: Word = Word::MAX;
/// Alternating bits starting with bit 0 set (`0x5555...`).
pub const CHECKERBOARD1: Word = Word::MAX / 3;
/// Alternating bits starting with bit 1 set (`0xAAAA...`).
pub const CHECKERBOARD2: Word = !CHECKERBOARD1;
/// `0x0101...`: multiply by a byte to replicate it across the word.
pub const ONE_PER_BYTE: Word = Word::MAX / 0xFF;

pub const SOLID_BITS_PASSES: usize = 64;
pub const CHECKERBOARD_PASSES: usize = 64;
/// Words written with the same byte value before advancing to the next.
pub const BLOCK_SEQ_WORDS: usize = 64;
pub const BLOCK_SEQ_PASSES: usize = 256;
/// Polarity rounds per bit position in the bit flip pattern.
pub const BIT_FLIP_ROUNDS: usize = 8;

/// A deterministic, multi-pass word pattern.
pub trait Pattern {
    /// Generator for a single pass.
    type Words: Iterator<Item = Word>;

    /// Number of write/verify passes.
    fn passes(&self) -> usize;

    /// Builds a fresh generator for `pass`.
    fn pass(&self, pass: usize) -> Self::Words;
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Re-seedable pseudo-random words.
#[derive(Debug, Clone)]
pub struct RandomWords {
    rng: StdRng,
}

impl RandomWords {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_word(&mut self) -> Word {
        self.rng.gen()
    }
}

impl Iterator for RandomWords {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        Some(self.next_word())
    }
}

/// Random operands for a transform. Zero is resampled for division.
#[derive(Debug, Clone)]
pub struct Operands {
    words: RandomWords,
    nonzero: bool,
}

impl Operands {
    pub fn new(transform: Transform, seed: u64) -> Self {
        Self {
            words: RandomWords::new(seed),
            nonzero: transform == Transform::Div,
        }
    }
}

impl Iterator for Operands {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        loop {
            let operand = self.words.next_word();
            if !self.nonzero || operand != 0 {
                return Some(operand);
            }
        }
    }
}

/// `start`, `start + 1`, ... with wraparound.
#[derive(Debug, Clone)]
pub struct Counter {
    next: Word,
}

impl Counter {
    pub fn new(start: Word) -> Self {
        Self { next: start }
    }
}

impl Iterator for Counter {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        let value = self.next;
        self.next = value.wrapping_add(1);
        Some(value)
    }
}

/// `base`, `!base`, `base`, ...
#[derive(Debug, Clone)]
pub struct Alternating {
    next: Word,
}

impl Alternating {
    pub fn new(base: Word) -> Self {
        Self { next: base }
    }
}

impl Iterator for Alternating {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        let value = self.next;
        self.next = !value;
        Some(value)
    }
}

/// A single set (or clear) bit that moves up one position per word,
/// wrapping from the top bit back to bit 0.
#[derive(Debug, Clone)]
pub struct WalkingBits {
    position: usize,
    invert: bool,
}

impl WalkingBits {
    pub fn ones(start: usize) -> Self {
        Self {
            position: start % WORD_BITS,
            invert: false,
        }
    }

    pub fn zeroes(start: usize) -> Self {
        Self {
            position: start % WORD_BITS,
            invert: true,
        }
    }
}

impl Iterator for WalkingBits {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        let bit = 1 << self.position;
        self.position = (self.position + 1) % WORD_BITS;
        Some(if self.invert { !bit } else { bit })
    }
}

/// Blocks of `BLOCK_SEQ_WORDS` identical words, each block holding the next
/// byte value replicated across the word.
#[derive(Debug, Clone)]
pub struct BlockSequence {
    first: usize,
    index: usize,
}

impl BlockSequence {
    pub fn new(first: usize) -> Self {
        Self { first, index: 0 }
    }
}

impl Iterator for BlockSequence {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        let byte = (self.first + self.index / BLOCK_SEQ_WORDS) % 256;
        self.index += 1;
        Some(byte * ONE_PER_BYTE)
    }
}

/// Binary operation combining a value with a random operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Xor,
    Sub,
    Mul,
    Div,
    Or,
    And,
}

impl Transform {
    /// Applies the transform with wrapping semantics.
    ///
    /// # Panics
    /// Panics on `Div` with a zero operand; `Operands` never yields one.
    pub fn apply(self, value: Word, operand: Word) -> Word {
        match self {
            Transform::Xor => value ^ operand,
            Transform::Sub => value.wrapping_sub(operand),
            Transform::Mul => value.wrapping_mul(operand),
            Transform::Div => value / operand,
            Transform::Or => value | operand,
            Transform::And => value & operand,
        }
    }
}

/// Values from an inner generator combined with transform operands.
#[derive(Debug, Clone)]
pub struct TransformedWords<I> {
    values: I,
    operands: Operands,
    transform: Transform,
}

impl<I: Iterator<Item = Word>> Iterator for TransformedWords<I> {
    type Item = Word;

    fn next(&mut self) -> Option<Word> {
        let value = self.values.next()?;
        let operand = self.operands.next()?;
        Some(self.transform.apply(value, operand))
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// One pass of pseudo-random words.
#[derive(Debug, Clone, Copy)]
pub struct RandomValue {
    pub seed: u64,
}

impl Pattern for RandomValue {
    type Words = RandomWords;

    fn passes(&self) -> usize {
        1
    }

    fn pass(&self, _pass: usize) -> RandomWords {
        RandomWords::new(self.seed)
    }
}

/// A pattern whose words are transformed with a random operand stream.
#[derive(Debug, Clone, Copy)]
pub struct Transformed<P> {
    pub values: P,
    pub transform: Transform,
    pub operand_seed: u64,
}

impl<P: Pattern> Pattern for Transformed<P> {
    type Words = TransformedWords<P::Words>;

    fn passes(&self) -> usize {
        self.values.passes()
    }

    fn pass(&self, pass: usize) -> Self::Words {
        TransformedWords {
            values: self.values.pass(pass),
            operands: Operands::new(self.transform, self.operand_seed.wrapping_add(pass as u64)),
            transform: self.transform,
        }
    }
}

/// A counter starting from a random word.
#[derive(Debug, Clone, Copy)]
pub struct SequentialIncrement {
    pub seed: u64,
}

impl Pattern for SequentialIncrement {
    type Words = Counter;

    fn passes(&self) -> usize {
        1
    }

    fn pass(&self, _pass: usize) -> Counter {
        Counter::new(RandomWords::new(self.seed).next_word())
    }
}

/// All-ones and all-zeros words alternating by position, with the starting
/// polarity alternating by pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolidBits;

impl Pattern for SolidBits {
    type Words = Alternating;

    fn passes(&self) -> usize {
        SOLID_BITS_PASSES
    }

    fn pass(&self, pass: usize) -> Alternating {
        Alternating::new(if pass % 2 == 0 { ONE_BITS } else { 0 })
    }
}

/// `0x55..` and `0xAA..` words alternating by position and by pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkerboard;

impl Pattern for Checkerboard {
    type Words = Alternating;

    fn passes(&self) -> usize {
        CHECKERBOARD_PASSES
    }

    fn pass(&self, pass: usize) -> Alternating {
        Alternating::new(if pass % 2 == 0 {
            CHECKERBOARD1
        } else {
            CHECKERBOARD2
        })
    }
}

/// Replicated-byte blocks; pass `p` starts at byte value `p`, so every block
/// sees all 256 byte values over the sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSequential;

impl Pattern for BlockSequential {
    type Words = BlockSequence;

    fn passes(&self) -> usize {
        BLOCK_SEQ_PASSES
    }

    fn pass(&self, pass: usize) -> BlockSequence {
        BlockSequence::new(pass)
    }
}

/// Walking single set bit; pass `p` starts at bit `p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkingOnes;

impl Pattern for WalkingOnes {
    type Words = WalkingBits;

    fn passes(&self) -> usize {
        WORD_BITS
    }

    fn pass(&self, pass: usize) -> WalkingBits {
        WalkingBits::ones(pass)
    }
}

/// Walking single clear bit; pass `p` starts at bit `p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkingZeroes;

impl Pattern for WalkingZeroes {
    type Words = WalkingBits;

    fn passes(&self) -> usize {
        WORD_BITS
    }

    fn pass(&self, pass: usize) -> WalkingBits {
        WalkingBits::zeroes(pass)
    }
}

/// Bits `pos` and `pos + 2` set; a bit past the top of the word is dropped.
pub fn bit_spread(pos: usize) -> Word {
    let low = (1 as Word).checked_shl(pos as u32).unwrap_or(0);
    let high = (1 as Word).checked_shl((pos + 2) as u32).unwrap_or(0);
    low | high
}

/// Two bits a position apart, swept up then back down.
///
/// Pass `p` uses `bit_spread(p)` for `p < WORD_BITS` and
/// `bit_spread(2 * WORD_BITS - 1 - p)` afterwards; odd words hold the
/// complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitSpread;

impl BitSpread {
    pub fn position(pass: usize) -> usize {
        if pass < WORD_BITS {
            pass
        } else {
            2 * WORD_BITS - 1 - pass
        }
    }
}

impl Pattern for BitSpread {
    type Words = Alternating;

    fn passes(&self) -> usize {
        2 * WORD_BITS
    }

    fn pass(&self, pass: usize) -> Alternating {
        Alternating::new(bit_spread(Self::position(pass)))
    }
}

/// Single-bit word for each bit position, flipped between polarities.
///
/// Pass `p` covers bit `k = p / BIT_FLIP_ROUNDS`; its base is `!(1 << k)` on
/// even rounds and `1 << k` on odd rounds, and odd words hold the complement.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitFlip;

impl BitFlip {
    pub fn base(pass: usize) -> Word {
        let bit: Word = 1 << (pass / BIT_FLIP_ROUNDS);
        if pass % 2 == 0 {
            !bit
        } else {
            bit
        }
    }
}

impl Pattern for BitFlip {
    type Words = Alternating;

    fn passes(&self) -> usize {
        WORD_BITS * BIT_FLIP_ROUNDS
    }

    fn pass(&self, pass: usize) -> Alternating {
        Alternating::new(Self::base(pass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BLOCK_SIZE: usize = 1024;

    fn take<P: Pattern>(pattern: &P, pass: usize, n: usize) -> Vec<Word> {
        pattern.pass(pass).take(n).collect()
    }

    #[test]
    fn test_constants() {
        assert_eq!(CHECKERBOARD1 & CHECKERBOARD2, 0);
        assert_eq!(CHECKERBOARD1 | CHECKERBOARD2, ONE_BITS);
        assert_eq!(CHECKERBOARD1 & 0xFF, 0x55);
        assert_eq!(ONE_PER_BYTE * 0xFF, ONE_BITS);
        assert_eq!(ONE_PER_BYTE & 0xFFFF, 0x0101);
    }

    #[test]
    fn test_random_pattern_deterministic() {
        let pattern = RandomValue { seed: 42 };
        assert_eq!(
            take(&pattern, 0, TEST_BLOCK_SIZE),
            take(&pattern, 0, TEST_BLOCK_SIZE),
            "Same seed should produce same pattern"
        );
    }

    #[test]
    fn test_random_pattern_different_seeds() {
        assert_ne!(
            take(&RandomValue { seed: 1 }, 0, TEST_BLOCK_SIZE),
            take(&RandomValue { seed: 2 }, 0, TEST_BLOCK_SIZE),
            "Different seeds should produce different patterns"
        );
    }

    #[test]
    fn test_random_words_independent_instances() {
        let mut a = RandomWords::new(7);
        let first: Vec<Word> = (&mut a).take(10).collect();
        let mut b = RandomWords::new(7);
        let second: Vec<Word> = (&mut b).take(10).collect();
        assert_eq!(first, second);
        // advancing one instance leaves the other untouched
        a.next_word();
        assert_eq!(a.next_word(), RandomWords::new(7).nth(11).unwrap());
    }

    #[test]
    fn test_div_operands_never_zero() {
        for seed in 0..4 {
            let operands = Operands::new(Transform::Div, seed);
            assert!(operands.take(10_000).all(|op| op != 0));
        }
    }

    #[test]
    fn test_non_div_operands_match_random_stream() {
        let operands: Vec<Word> = Operands::new(Transform::Xor, 9).take(100).collect();
        let random: Vec<Word> = RandomWords::new(9).take(100).collect();
        assert_eq!(operands, random);
    }

    #[test]
    fn test_transform_wrapping() {
        assert_eq!(Transform::Sub.apply(0, 1), Word::MAX);
        assert_eq!(Transform::Mul.apply(Word::MAX, 2), Word::MAX - 1);
        assert_eq!(Transform::Div.apply(100, 7), 14);
        assert_eq!(Transform::Xor.apply(0b1100, 0b1010), 0b0110);
        assert_eq!(Transform::Or.apply(0b1100, 0b1010), 0b1110);
        assert_eq!(Transform::And.apply(0b1100, 0b1010), 0b1000);
    }

    #[test]
    fn test_transformed_combines_streams() {
        let pattern = Transformed {
            values: RandomValue { seed: 5 },
            transform: Transform::Xor,
            operand_seed: 6,
        };
        let expected: Vec<Word> = RandomWords::new(5)
            .zip(RandomWords::new(6))
            .map(|(v, r)| v ^ r)
            .take(64)
            .collect();
        assert_eq!(take(&pattern, 0, 64), expected);
        assert_eq!(pattern.passes(), 1);
    }

    #[test]
    fn test_sequential_increment() {
        let pattern = SequentialIncrement { seed: 3 };
        let start = RandomWords::new(3).next_word();
        let words = take(&pattern, 0, 16);
        for (i, &word) in words.iter().enumerate() {
            assert_eq!(word, start.wrapping_add(i as Word));
        }
    }

    #[test]
    fn test_counter_wraps() {
        let words: Vec<Word> = Counter::new(Word::MAX).take(2).collect();
        assert_eq!(words, vec![Word::MAX, 0]);
    }

    #[test]
    fn test_solid_bits_polarity() {
        assert_eq!(take(&SolidBits, 0, 4), vec![ONE_BITS, 0, ONE_BITS, 0]);
        assert_eq!(take(&SolidBits, 1, 4), vec![0, ONE_BITS, 0, ONE_BITS]);
        assert_eq!(SolidBits.passes(), SOLID_BITS_PASSES);
    }

    #[test]
    fn test_checkerboard_inverse_relationship() {
        let even = take(&Checkerboard, 0, TEST_BLOCK_SIZE);
        let odd = take(&Checkerboard, 1, TEST_BLOCK_SIZE);
        assert_eq!(even[0], CHECKERBOARD1);
        assert_eq!(odd[0], CHECKERBOARD2);
        for (c, i) in even.iter().zip(odd.iter()) {
            assert_eq!(
                *c ^ *i,
                ONE_BITS,
                "Checkerboard passes should XOR to all 1s"
            );
        }
    }

    #[test]
    fn test_block_sequence_blocks() {
        let words = take(&BlockSequential, 0, BLOCK_SEQ_WORDS * 3);
        assert!(words[..BLOCK_SEQ_WORDS].iter().all(|&w| w == 0));
        assert!(words[BLOCK_SEQ_WORDS..2 * BLOCK_SEQ_WORDS]
            .iter()
            .all(|&w| w == ONE_PER_BYTE));
        assert!(words[2 * BLOCK_SEQ_WORDS..].iter().all(|&w| w == 2 * ONE_PER_BYTE));
    }

    #[test]
    fn test_block_sequence_wraps_byte() {
        let mut blocks = BlockSequence::new(255);
        assert_eq!(blocks.next(), Some(0xFF * ONE_PER_BYTE));
        let next_block = blocks.nth(BLOCK_SEQ_WORDS - 1).unwrap();
        assert_eq!(next_block, 0);
    }

    #[test]
    fn test_walking_ones_complete_sweep() {
        let words = take(&WalkingOnes, 0, WORD_BITS);
        let mut seen = vec![0usize; WORD_BITS];
        for word in words {
            assert_eq!(word.count_ones(), 1);
            seen[word.trailing_zeros() as usize] += 1;
        }
        assert!(seen.iter().all(|&n| n == 1), "every bit set exactly once");
    }

    #[test]
    fn test_walking_ones_passes_rotate_start() {
        for pass in 0..WalkingOnes.passes() {
            assert_eq!(WalkingOnes.pass(pass).next(), Some(1 << pass));
        }
    }

    #[test]
    fn test_walking_zeroes_complete_sweep() {
        let words = take(&WalkingZeroes, 3, WORD_BITS * 2);
        let mut seen = vec![0usize; WORD_BITS];
        for word in words {
            assert_eq!(word.count_zeros(), 1);
            seen[(!word).trailing_zeros() as usize] += 1;
        }
        assert!(seen.iter().all(|&n| n == 2));
    }

    #[test]
    fn test_bit_spread_formula() {
        assert_eq!(bit_spread(0), 0b101);
        assert_eq!(bit_spread(3), 0b101000);
        assert_eq!(bit_spread(WORD_BITS - 2), 1 << (WORD_BITS - 2));
        assert_eq!(bit_spread(WORD_BITS - 1), 1 << (WORD_BITS - 1));
    }

    #[test]
    fn test_bit_spread_sweeps_up_and_down() {
        assert_eq!(BitSpread::position(0), 0);
        assert_eq!(BitSpread::position(WORD_BITS - 1), WORD_BITS - 1);
        assert_eq!(BitSpread::position(WORD_BITS), WORD_BITS - 1);
        assert_eq!(BitSpread::position(2 * WORD_BITS - 1), 0);
        assert_eq!(take(&BitSpread, 1, 2), vec![0b1010, !0b1010]);
    }

    #[test]
    fn test_bit_flip_bases() {
        assert_eq!(BitFlip::base(0), !1);
        assert_eq!(BitFlip::base(1), 1);
        assert_eq!(BitFlip::base(BIT_FLIP_ROUNDS), !(1 << 1));
        assert_eq!(
            BitFlip::base(BitFlip.passes() - 1),
            1 << (WORD_BITS - 1)
        );
        assert_eq!(take(&BitFlip, 1, 3), vec![1, !1, 1]);
    }

    #[test]
    fn test_every_pattern_regenerates_identically() {
        fn check<P: Pattern>(pattern: P) {
            for pass in [0, pattern.passes() - 1] {
                assert_eq!(take(&pattern, pass, 300), take(&pattern, pass, 300));
            }
        }
        check(RandomValue { seed: 11 });
        check(SequentialIncrement { seed: 11 });
        check(SolidBits);
        check(Checkerboard);
        check(BlockSequential);
        check(WalkingOnes);
        check(WalkingZeroes);
        check(BitSpread);
        check(BitFlip);
        check(Transformed {
            values: RandomValue { seed: 1 },
            transform: Transform::Div,
            operand_seed: 2,
        });
    }
}
