mod catalog;
mod compare;
mod error;
mod harness;
mod memory;
mod patterns;
mod stats;
mod stuck_address;
#[cfg(test)]
mod testing;
mod traits;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use clap::Parser;
use log::info;

use catalog::{TestKind, TestSelection, CATALOG};
use error::MemcheckError;
use harness::{Harness, HarnessConfig, Iterations, RunSummary, EXIT_FAIL_NONSTARTER};
use memory::MemoryRegion;
use traits::{Word, WORD_BITS};

const DEFAULT_MEMORY: &str = "64MiB";

#[derive(Parser, Debug)]
#[command(author, version, about = "Memory integrity diagnostic", long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        default_value = DEFAULT_MEMORY,
        help = "Amount of memory to test (e.g., '64MiB', '1GB')"
    )]
    memory: ByteSize,

    #[arg(
        short,
        long,
        default_value_t = 1,
        help = "Number of loops (0: run until interrupted)"
    )]
    loops: u64,

    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Comma-separated tests to run (default: all)"
    )]
    tests: Vec<TestKind>,

    /// Base seed for the random patterns
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, help = "Duration to run (e.g., '5m', '1h', 'infinite')")]
    duration: Option<String>,

    /// List available tests and exit
    #[arg(long, default_value_t = false)]
    list_tests: bool,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_duration(s: &str) -> Option<Duration> {
    if s.to_lowercase() == "infinite" {
        return None;
    }
    humantime::parse_duration(s).ok()
}

fn build_config(args: &Args) -> Result<HarnessConfig, MemcheckError> {
    let timeout = match args.duration.as_deref() {
        Some(s) if s.eq_ignore_ascii_case("infinite") => None,
        Some(s) => Some(
            parse_duration(s)
                .ok_or_else(|| MemcheckError::Config(format!("invalid duration '{s}'")))?,
        ),
        None => None,
    };
    let selection = if args.tests.is_empty() {
        TestSelection::all()
    } else {
        TestSelection::only(args.tests.iter().copied())
    };

    Ok(HarnessConfig {
        memory: args.memory,
        iterations: Iterations::from_loops(args.loops),
        selection,
        seed: args.seed,
        timeout,
        progress: !args.no_progress,
    })
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn allocate(words: usize) -> Result<Vec<Word>, MemcheckError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(words).map_err(|e| {
        MemcheckError::Config(format!("failed to allocate {} words: {}", words, e))
    })?;
    buffer.resize(words, 0);
    Ok(buffer)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_tests {
        println!("Available tests:");
        for descriptor in CATALOG {
            println!("  {:<18} {}", descriptor.id, descriptor.name);
        }
        std::process::exit(0);
    }

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAIL_NONSTARTER);
        }
    };

    let start_time = Instant::now();
    match run(config) {
        Ok(summary) => {
            print_summary(&summary, start_time.elapsed());
            std::process::exit(summary.exit_code());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_FAIL_NONSTARTER);
        }
    }
}

fn run(config: HarnessConfig) -> Result<RunSummary, MemcheckError> {
    let should_stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&should_stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))?;

    let words = config.word_count()?;
    let mut buffer = allocate(words)?;
    let mut region = MemoryRegion::new(&mut buffer);

    println!("Memory Integrity Test");
    println!("=====================");
    println!(
        "Memory to test: {} ({} x {}-bit words)",
        config.memory, words, WORD_BITS
    );
    match config.iterations {
        Iterations::Finite(loops) => println!("Loops: {}", loops),
        Iterations::Unbounded => println!("Loops: until interrupted"),
    }
    if let Some(timeout) = config.timeout {
        println!("Duration: {}", humantime::format_duration(timeout));
    }
    println!();
    info!("Region base address: 0x{:X}", region.base_address());

    let summary = Harness::new(config).run(&mut region, &should_stop)?;
    println!("Seed: {}", summary.seed);
    Ok(summary)
}

fn print_summary(summary: &RunSummary, elapsed: Duration) {
    println!();
    println!("Test Complete");
    println!("=============");
    println!("Loops completed: {}", summary.loops_completed);
    println!(
        "Total bytes tested: {}",
        ByteSize::b(summary.stats.get_bytes())
    );
    println!("Total tests completed: {}", summary.stats.get_tests());
    println!("Errors found: {}", summary.stats.get_failures());
    println!("Duration: {:.2}s", elapsed.as_secs_f64());
    if summary.cancelled {
        println!("Stopped early (interrupt or duration limit)");
    }

    if summary.is_success() {
        println!();
        println!("SUCCESS: No memory errors detected!");
    } else {
        println!();
        println!("MEMORY ERRORS DETECTED:");
        println!("=======================");
        for (i, record) in summary.failures.iter().enumerate() {
            println!("Error {}: {}", i + 1, MemcheckError::from(*record));
        }
        println!();
        println!("Rerun with --seed {} to reproduce", summary.seed);
    }
}
