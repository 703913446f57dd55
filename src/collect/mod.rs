//! Result aggregation.
//!
//! The collector consumes the runner's result queue on the caller's task. It keeps the ledger of completed runs and
//! the error count, renders each result as it arrives and, when nothing has arrived for a ticker period, lists the
//! jobs that are still running.
//!
//! ## States
//!
//! ```text
//! Running ──(run cancelled)──► Draining ──(queue closed)──► Done
//!    └──────(queue closed or error limit reached)──────────►┘
//! ```
//!
//! While draining, results of jobs that were already running are still recorded. Reaching the error limit cancels
//! the run and stops immediately.

pub mod report;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use crate::results::Run;
use crate::run::{ActiveJobs, Event, JobResult};

pub use report::{ConsoleReporter, OutputFormat, Reporter, render_run};

/// Message rendered when the error limit is reached.
pub const TOO_MANY_ERRORS: &str = "too many errors. Exiting.";

/// Default period of silence before active jobs are listed.
pub const DEFAULT_TICKER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Stop after this many non-pass results; 0 disables the limit.
    pub max_fail: u64,
    /// Period of silence before active jobs are listed.
    pub ticker: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_fail: 0,
            ticker: DEFAULT_TICKER,
        }
    }
}

/// What the collector saw.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Completed runs in arrival order.
    pub runs: Vec<Run>,
    /// Number of results that were not a `pass` verdict.
    pub errors: u64,
    /// Whether the error limit stopped the run.
    pub tripped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Trip,
}

/// Aggregation state for one run.
pub struct Collector<R> {
    reporter: R,
    options: CollectOptions,
    runs: Vec<Run>,
    errors: u64,
    begins: HashMap<u64, DateTime<Utc>>,
}

impl<R: Reporter> Collector<R> {
    pub fn new(reporter: R, options: CollectOptions) -> Self {
        Self {
            reporter,
            options,
            runs: Vec::new(),
            errors: 0,
            begins: HashMap::new(),
        }
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Consume `results` until the queue closes or the error limit is reached.
    ///
    /// Reaching the limit cancels `token`. Cancellation from elsewhere only switches to draining: the loop keeps
    /// recording results until the queue closes.
    pub async fn collect(
        mut self,
        token: &CancellationToken,
        results: &mut mpsc::UnboundedReceiver<JobResult>,
        active: &ActiveJobs,
    ) -> Summary {
        let period = self.options.ticker.max(Duration::from_millis(1));
        let ticker = sleep(period);
        tokio::pin!(ticker);
        let mut state = State::Running;
        let mut tripped = false;

        loop {
            tokio::select! {
                res = results.recv() => {
                    let Some(res) = res else { break };
                    ticker.as_mut().reset(Instant::now() + period);
                    if self.observe(res) == Flow::Trip {
                        tripped = true;
                        token.cancel();
                        break;
                    }
                }
                () = &mut ticker => {
                    self.reporter.on_idle(&active.snapshot());
                    ticker.as_mut().reset(Instant::now() + period);
                }
                () = token.cancelled(), if state == State::Running => {
                    tracing::info!(running = active.len(), "run cancelled, waiting for running jobs");
                    state = State::Draining;
                }
            }
        }

        Summary {
            runs: self.runs,
            errors: self.errors,
            tripped,
        }
    }

    /// Record one result and render it.
    fn observe(&mut self, res: JobResult) -> Flow {
        tracing::debug!(job = %res.job.name, seq = res.job.seq, event = ?res.event, "result");

        if let Event::Start { time } = res.event {
            self.begins.insert(res.job.seq, time);
            self.reporter.on_start(&res.job);
            return Flow::Continue;
        }

        let begin = self.begins.remove(&res.job.seq).unwrap_or_else(|| {
            tracing::warn!(job = %res.job.name, seq = res.job.seq, "terminal event without start event");
            res.event.time()
        });
        let Some(run) = Run::from_result(&res, begin) else {
            return Flow::Continue;
        };

        if !res.event.is_pass() {
            self.errors += 1;
        }
        self.reporter.on_complete(&run, run.duration());
        self.runs.push(run);

        if self.options.max_fail > 0 && self.errors >= self.options.max_fail {
            tracing::warn!(errors = self.errors, max_fail = self.options.max_fail, "error limit reached");
            self.reporter.on_fatal(TOO_MANY_ERRORS);
            return Flow::Trip;
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Suite;
    use crate::run::{Job, JobFactory};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use suiterun_core::Verdict;

    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
        idle: Arc<AtomicUsize>,
    }

    impl Reporter for Recorder {
        fn on_complete(&mut self, run: &Run, _duration: Duration) {
            self.lines.push(format!("{} {}", run.verdict, run.name));
        }

        fn on_idle(&mut self, _active: &[Arc<Job>]) {
            self.idle.fetch_add(1, Ordering::SeqCst);
        }

        fn on_fatal(&mut self, message: &str) {
            self.lines.push(format!("fatal {message}"));
        }
    }

    fn job(factory: &JobFactory, name: &str) -> Arc<Job> {
        let suite = Arc::new(Suite::from_manifest("/s".into(), Default::default()).unwrap());
        Arc::new(factory.new_job(name.into(), suite))
    }

    #[test]
    fn begin_comes_from_start_event() {
        let f = JobFactory::new(None);
        let j = job(&f, "m.a");
        let mut c = Collector::new(Recorder::default(), CollectOptions::default());
        let start = Event::start();
        let started_at = start.time();
        c.observe(JobResult::new(j.clone(), start));
        c.observe(JobResult::new(j, Event::stop(Verdict::pass())));
        assert_eq!(c.runs[0].begin, started_at);
        assert!(c.runs[0].end >= started_at);
        assert_eq!(c.errors(), 0);
    }

    #[test]
    fn terminal_without_start_uses_end_as_begin() {
        let f = JobFactory::new(None);
        let mut c = Collector::new(Recorder::default(), CollectOptions::default());
        c.observe(JobResult::new(job(&f, "m.a"), Event::error("lost")));
        assert_eq!(c.runs[0].begin, c.runs[0].end);
        assert_eq!(c.runs[0].verdict, "fatal");
        assert_eq!(c.errors(), 1);
    }

    #[test]
    fn limit_trips_after_render() {
        let f = JobFactory::new(None);
        let mut c = Collector::new(
            Recorder::default(),
            CollectOptions {
                max_fail: 2,
                ..CollectOptions::default()
            },
        );
        assert_eq!(c.observe(JobResult::new(job(&f, "m.a"), Event::stop(Verdict::fail()))), Flow::Continue);
        assert_eq!(c.observe(JobResult::new(job(&f, "m.b"), Event::stop(Verdict::pass()))), Flow::Continue);
        assert_eq!(c.observe(JobResult::new(job(&f, "m.c"), Event::error("x"))), Flow::Trip);
        assert_eq!(
            c.reporter.lines,
            vec!["fail m.a", "pass m.b", "fatal m.c", "fatal too many errors. Exiting."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_fires_only_when_idle() {
        let f = JobFactory::new(None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let idle = Arc::new(AtomicUsize::new(0));
        let collector = Collector::new(
            Recorder {
                idle: idle.clone(),
                ..Recorder::default()
            },
            CollectOptions {
                max_fail: 0,
                ticker: Duration::from_secs(10),
            },
        );
        let producer = tokio::spawn(async move {
            let j = job(&f, "m.a");
            tx.send(JobResult::new(j.clone(), Event::start())).unwrap();
            tokio::time::sleep(Duration::from_secs(25)).await;
            tx.send(JobResult::new(j, Event::stop(Verdict::pass()))).unwrap();
        });
        let summary = collector.collect(&token, &mut rx, &ActiveJobs::default()).await;
        producer.await.unwrap();
        assert_eq!(summary.runs.len(), 1);
        // Silent from 0s to 25s with a 10s period: ticks at 10s and 20s.
        assert_eq!(idle.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn external_cancel_drains_remaining_results() {
        let f = JobFactory::new(None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        token.cancel();
        for name in ["m.a", "m.b"] {
            let j = job(&f, name);
            tx.send(JobResult::new(j.clone(), Event::start())).unwrap();
            tx.send(JobResult::new(j, Event::stop(Verdict::fail()))).unwrap();
        }
        drop(tx);
        let summary = Collector::new(Recorder::default(), CollectOptions::default())
            .collect(&token, &mut rx, &ActiveJobs::default())
            .await;
        assert_eq!(summary.runs.len(), 2);
        assert_eq!(summary.errors, 2);
        assert!(!summary.tripped);
    }

    #[tokio::test]
    async fn tripping_cancels_the_run() {
        let f = JobFactory::new(None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        for name in ["m.a", "m.b", "m.c"] {
            tx.send(JobResult::new(job(&f, name), Event::error("boom"))).unwrap();
        }
        let summary = Collector::new(
            Recorder::default(),
            CollectOptions {
                max_fail: 1,
                ..CollectOptions::default()
            },
        )
        .collect(&token, &mut rx, &ActiveJobs::default())
        .await;
        assert!(summary.tripped);
        assert!(token.is_cancelled());
        assert_eq!(summary.runs.len(), 1);
        drop(tx);
    }
}
