#![forbid(unsafe_code)]
//! suiterun: parallel runner for TTCN-3 test suites.
//!
//! Given a suite (a `package.yml` manifest and its sources) suiterun selects test identifiers, runs every selected
//! test as an independent job on a bounded worker pool, reports each verdict as it arrives and persists a results
//! database at the end of the run.
//!
//! ## Pipeline
//!
//! ```text
//! Suite ─► generate (parse_cache, basket) ─► JobFactory ─► Runner ─► collect ─► results
//!                                              └──────────► delegate (alternative backend)
//! ```
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `run` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod backend;
pub mod basket;
pub mod cli;
pub mod collect;
pub mod generate;
pub mod parse_cache;
pub mod project;
pub mod results;
pub mod run;
pub mod signal;
pub mod version;

pub use backend::{Backend, Execute, RunError, RunOutcome};
pub use basket::{Basket, Selector};
pub use collect::{Collector, OutputFormat, Reporter};
pub use parse_cache::ParseCache;
pub use project::{ConfigError, Suite};
pub use results::{ResultsFile, Run, RunDb};
pub use run::{Event, Job, JobExecutor, JobFactory, JobResult, Runner};
