//! In-process execution.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Execute, RunError, RunOutcome};
use crate::collect::{CollectOptions, Collector, Reporter};
use crate::results::{ResultsFile, RunDb};
use crate::run::{Job, JobExecutor, Runner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalOptions {
    pub max_workers: usize,
    /// Stop after this many errors; 0 disables the limit.
    pub max_fail: u64,
    pub ticker: Duration,
}

/// Runs jobs on a local worker pool and records the results.
pub struct LocalBackend<E> {
    executor: E,
    reporter: Box<dyn Reporter + Send>,
    options: LocalOptions,
    results: ResultsFile,
}

impl<E: JobExecutor> LocalBackend<E> {
    pub fn new(executor: E, reporter: Box<dyn Reporter + Send>, options: LocalOptions, results: ResultsFile) -> Self {
        Self {
            executor,
            reporter,
            options,
            results,
        }
    }
}

impl<E: JobExecutor> Execute for LocalBackend<E> {
    /// Remove stale results, run every job, then write the results database.
    ///
    /// The database is written even when the run fails or is cancelled. A write failure takes precedence over
    /// test failures in the returned error.
    #[tracing::instrument(skip_all, fields(max_workers = self.options.max_workers, max_fail = self.options.max_fail))]
    async fn execute(self, token: CancellationToken, jobs: mpsc::Receiver<Job>) -> Result<RunOutcome, RunError> {
        self.results.remove_stale()?;

        let runner = Runner::new(self.options.max_workers, self.executor);
        let mut results = runner.run(token.clone(), jobs);
        let collector = Collector::new(
            self.reporter,
            CollectOptions {
                max_fail: self.options.max_fail,
                ticker: self.options.ticker,
            },
        );
        let summary = collector.collect(&token, &mut results, &runner.active()).await;

        let outcome = RunOutcome {
            runs: summary.runs.len(),
            errors: summary.errors,
        };
        tracing::info!(runs = outcome.runs, errors = outcome.errors, "run finished");

        let db = RunDb::single_session(runner.max_workers(), summary.runs);
        if let Err(err) = self.results.write(&db) {
            tracing::error!(error = %err, errors = outcome.errors, "results were not saved");
            return Err(err.into());
        }

        if summary.tripped {
            Err(RunError::TooManyFailures { count: summary.errors })
        } else if summary.errors > 0 {
            Err(RunError::Failed { count: summary.errors })
        } else {
            Ok(outcome)
        }
    }
}
