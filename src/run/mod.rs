//! Job execution.
//!
//! ## Modules
//!
//! - `job` - Job records and the job factory
//! - `event` - Lifecycle events reported for each job
//! - `executor` - How one job is evaluated (`JobExecutor` seam, runtime command by default)
//! - `runner` - Bounded worker pool with an active-job snapshot

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod event;
pub mod executor;
pub mod job;
pub mod runner;

pub use event::{Event, JobResult};
pub use executor::{CommandExecutor, ExecError, JobExecutor};
pub use job::{Job, JobFactory};
pub use runner::{ActiveJobs, Runner};
