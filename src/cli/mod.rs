//! CLI module for suiterun
//!
//! This module provides the command-line interface of the runner.
//!
//! ## Commands
//!
//! - `run [PATHS]... [-- IDS...]` - Run the selected tests of a suite
//! - `list [PATHS]... [-- IDS...]` - Print the identifiers a run would execute
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits; the interrupt handler's forced exit is wired up
//! here as well.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use crate::collect::OutputFormat;
use crate::parse_cache::host_parallelism;
use crate::signal::FORCED_EXIT_CODE;
use crate::version::SUITERUN_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    pub const FORCED: ExitCode = ExitCode(FORCED_EXIT_CODE);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Parallel runner for TTCN-3 test suites
#[derive(Parser, Debug)]
#[command(name = "suiterun")]
#[command(version = SUITERUN_VERSION)]
#[command(about = "Parallel runner for TTCN-3 test suites", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run tests
    Run(RunArgs),
    /// List the test identifiers a run would execute
    List(SelectArgs),
}

/// What to run.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct SelectArgs {
    /// Suite directory, manifest, or files below the suite root (default: current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Explicit test identifiers; bypasses discovery
    #[arg(last = true, value_name = "TEST_ID")]
    pub ids: Vec<String>,

    /// Read additional test identifiers from FILE (`-` for stdin), one per line
    #[arg(short = 't', long = "tests-file", value_name = "FILE")]
    pub tests_file: Option<PathBuf>,

    /// Only run tests whose identifier matches REGEX
    #[arg(short = 'r', long = "run-pattern", value_name = "REGEX")]
    pub run_pattern: Vec<String>,

    /// Skip tests whose identifier matches REGEX
    #[arg(short = 'x', long = "exclude", value_name = "REGEX")]
    pub exclude: Vec<String>,

    /// Only run tests with a tag matching NAME[:VALUE] regexes
    #[arg(short = 'R', long = "tags-regex", value_name = "REGEX")]
    pub tags_regex: Vec<String>,

    /// Skip tests with a tag matching NAME[:VALUE] regexes
    #[arg(short = 'X', long = "exclude-tags", value_name = "REGEX")]
    pub exclude_tags: Vec<String>,

    /// Comma separated list of manifest baskets; a test must match at least one
    #[arg(long, value_name = "NAMES", env = "SUITERUN_BASKETS", value_delimiter = ',')]
    pub baskets: Vec<String>,

    /// Identifier policy: `old` runs control parts instead of test cases
    #[arg(long, value_name = "POLICY", env = "SUITERUN_RUN_POLICY")]
    pub policy: Option<String>,
}

/// How to run.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct RunArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Number of tests running in parallel
    #[arg(short = 'j', long = "jobs", value_name = "N", default_value_t = host_parallelism())]
    pub jobs: usize,

    /// Stop after N failed tests (0: never)
    #[arg(long = "max-fail", value_name = "N", default_value_t = 0)]
    pub max_fail: u64,

    /// Run each test in its own directory below DIR
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "SUITERUN_FORMAT")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Seconds of silence before running tests are listed
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub ticker: u64,

    /// Delegate execution: `on`, `off`, or the path of a runner program
    #[arg(long, value_name = "PROGRAM", env = "SUITERUN_DELEGATE")]
    pub delegate: Option<String>,

    /// Extra flags for the delegate, whitespace separated
    #[arg(long = "delegate-flags", value_name = "FLAGS", env = "SUITERUN_DELEGATE_FLAGS", allow_hyphen_values = true)]
    pub delegate_flags: Option<String>,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error: cannot start async runtime: {e}")))?;

    match cli.command {
        Command::Run(args) => runtime.block_on(commands::run_tests(args, || process::exit(ExitCode::FORCED.0))),
        Command::List(args) => runtime.block_on(commands::list_tests(args)),
    }
}

// ============================================================================
// Tests
// ============================================================================
