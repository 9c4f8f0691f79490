//! The loop harness: runs the stuck-address test and the selected catalog
//! tests over a region, loop after loop, and reports each verdict.
//!
//! Cancellation (Ctrl-C or the optional timeout) is only checked between
//! tests; a test that has started always runs to completion.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rand::Rng;

use crate::catalog::{TestKind, TestSelection};
use crate::error::{MemcheckError, MemoryFault};
use crate::memory::BufferHalves;
use crate::stats::RunStats;
use crate::stuck_address;
use crate::traits::{TestResult, WordMemory, WORD_BYTES};

/// Exit status bit: the run could not start.
pub const EXIT_FAIL_NONSTARTER: i32 = 0x01;
/// Exit status bit: the stuck-address test failed.
pub const EXIT_FAIL_ADDRESS_LINES: i32 = 0x02;
/// Exit status bit: a catalog test failed.
pub const EXIT_FAIL_OTHER_TEST: i32 = 0x04;

const DEFAULT_MEMORY_MIB: u64 = 64;

/// How many loops to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    Finite(u64),
    /// Until cancelled.
    Unbounded,
}

impl Iterations {
    /// `0` means unbounded, as on the command line.
    pub fn from_loops(loops: u64) -> Self {
        if loops == 0 {
            Self::Unbounded
        } else {
            Self::Finite(loops)
        }
    }

    /// Whether 1-based loop `loop_index` is within the budget.
    pub fn allows(self, loop_index: u64) -> bool {
        match self {
            Self::Finite(loops) => loop_index <= loops,
            Self::Unbounded => true,
        }
    }
}

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Amount of memory to test.
    pub memory: ByteSize,
    /// Loop budget.
    pub iterations: Iterations,
    /// Catalog tests to run after the stuck-address test.
    pub selection: TestSelection,
    /// Base seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    /// Optional wall-clock limit.
    pub timeout: Option<Duration>,
    /// Show a progress bar.
    pub progress: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            memory: ByteSize::mib(DEFAULT_MEMORY_MIB),
            iterations: Iterations::Finite(1),
            selection: TestSelection::all(),
            seed: None,
            timeout: None,
            progress: true,
        }
    }
}

impl HarnessConfig {
    /// Number of whole words in the configured memory size.
    pub fn word_count(&self) -> Result<usize, MemcheckError> {
        let words = usize::try_from(self.memory.as_u64() / WORD_BYTES as u64).map_err(|_| {
            MemcheckError::Config(format!("{} does not fit in the address space", self.memory))
        })?;
        if words < 2 {
            return Err(MemcheckError::Config(format!(
                "{} is too small: at least {} bytes are needed",
                self.memory,
                2 * WORD_BYTES
            )));
        }
        Ok(words)
    }
}

/// Identifies a test in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestId {
    StuckAddress,
    Catalog(TestKind),
}

impl TestId {
    pub fn name(self) -> &'static str {
        match self {
            Self::StuckAddress => "Stuck Address",
            Self::Catalog(kind) => kind.name(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fault together with where in the run it was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureRecord {
    /// 1-based loop number.
    pub loop_index: u64,
    pub test: TestId,
    pub fault: MemoryFault,
}

impl From<FailureRecord> for MemcheckError {
    fn from(record: FailureRecord) -> Self {
        MemcheckError::Memory {
            test: record.test.name(),
            loop_index: record.loop_index,
            fault: record.fault,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Base seed; pass it back with `--seed` to reproduce the run.
    pub seed: u64,
    pub loops_completed: u64,
    pub stats: RunStats,
    pub failures: Vec<FailureRecord>,
    /// The run stopped early on Ctrl-C or timeout.
    pub cancelled: bool,
}

impl RunSummary {
    fn new(seed: u64) -> Self {
        Self {
            seed,
            loops_completed: 0,
            stats: RunStats::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }

    /// Process exit status: a bitwise OR of the `EXIT_FAIL_*` flags.
    pub fn exit_code(&self) -> i32 {
        self.failures.iter().fold(0, |code, failure| {
            code | match failure.test {
                TestId::StuckAddress => EXIT_FAIL_ADDRESS_LINES,
                TestId::Catalog(_) => EXIT_FAIL_OTHER_TEST,
            }
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Seed for loop `loop_index` derived from the run's base seed.
pub fn loop_seed(base_seed: u64, loop_index: u64) -> u64 {
    base_seed.wrapping_add(loop_index)
}

/// Seed for one catalog test within a loop.
pub fn test_seed(loop_seed: u64, kind: TestKind) -> u64 {
    loop_seed.wrapping_add(kind.index() as u64)
}

/// Runs loops of tests over a region.
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Runs the configured loops over `memory`.
    ///
    /// Returns an error only when the run cannot start; memory faults are
    /// collected in the summary.
    pub fn run<M: WordMemory + ?Sized>(
        &self,
        memory: &mut M,
        should_stop: &AtomicBool,
    ) -> Result<RunSummary, MemcheckError> {
        if memory.len() < 2 {
            return Err(MemcheckError::Config(format!(
                "region of {} words is too small: at least 2 are needed",
                memory.len()
            )));
        }
        if self.config.selection.is_empty() {
            warn!("No catalog tests selected; only the stuck address test will run");
        }

        let base_seed = self
            .config
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        info!("Base seed: {}", base_seed);

        let start_time = Instant::now();
        let mut summary = RunSummary::new(base_seed);
        let progress = self.progress_bar();

        let mut loop_index = 0;
        'loops: while self.config.iterations.allows(loop_index + 1) {
            if self.should_halt(should_stop, start_time) {
                summary.cancelled = true;
                break;
            }
            loop_index += 1;
            let seed = loop_seed(base_seed, loop_index);
            debug!("Loop {} seed: {}", loop_index, seed);

            progress.reset();
            progress.suspend(|| match self.config.iterations {
                Iterations::Finite(loops) => println!("Loop {}/{}:", loop_index, loops),
                Iterations::Unbounded => println!("Loop {}:", loop_index),
            });

            progress.set_message(TestId::StuckAddress.name());
            let result = stuck_address::run(&mut *memory);
            summary.stats.add_words(memory.len());
            self.record(&mut summary, &progress, loop_index, TestId::StuckAddress, result);

            for descriptor in self.config.selection.descriptors() {
                if self.should_halt(should_stop, start_time) {
                    summary.cancelled = true;
                    break 'loops;
                }
                progress.set_message(descriptor.name);
                let started = Instant::now();
                let mut halves = BufferHalves::split(&mut *memory);
                let result = descriptor.run(&mut halves, test_seed(seed, descriptor.kind));
                summary.stats.add_words(2 * halves.count());
                debug!("{} finished in {:?}", descriptor.name, started.elapsed());
                self.record(
                    &mut summary,
                    &progress,
                    loop_index,
                    TestId::Catalog(descriptor.kind),
                    result,
                );
            }

            summary.loops_completed += 1;
            progress.suspend(|| println!());
        }

        if summary.cancelled {
            warn!(
                "Run stopped after {} complete loop(s) ({:.1}s)",
                summary.loops_completed,
                start_time.elapsed().as_secs_f64()
            );
        }
        progress.finish_and_clear();
        Ok(summary)
    }

    fn should_halt(&self, should_stop: &AtomicBool, start_time: Instant) -> bool {
        should_stop.load(Ordering::Relaxed)
            || self
                .config
                .timeout
                .is_some_and(|timeout| start_time.elapsed() >= timeout)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(1 + self.config.selection.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} tests | {msg}",
        )
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style);
        progress
    }

    fn record(
        &self,
        summary: &mut RunSummary,
        progress: &ProgressBar,
        loop_index: u64,
        test: TestId,
        result: TestResult,
    ) {
        summary.stats.add_test(result.is_ok());
        progress.inc(1);
        match result {
            Ok(()) => progress.suspend(|| println!("  {}: ok", test)),
            Err(fault) => {
                progress.suspend(|| {
                    println!("  {}: FAILURE: {}", test, fault);
                    if test == TestId::StuckAddress {
                        println!("    possible bad address line");
                    }
                    println!("    flipped bits: 0x{:X}", fault.flipped_bits());
                });
                summary.failures.push(FailureRecord {
                    loop_index,
                    test,
                    fault,
                });
            }
        }
    }
}
