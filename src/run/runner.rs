//! Bounded worker pool.
//!
//! The runner consumes jobs from an input queue and evaluates at most `max_workers` of them at once. For every job
//! it emits `Start` and then one terminal event on its output queue. The output queue closes once the input queue is
//! exhausted (or the run is cancelled) and every started job has finished.
//!
//! Cancellation stops the runner from picking up new jobs; jobs already running are allowed to finish and their
//! results are still delivered.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::{Event, Job, JobExecutor, JobResult};

/// Jobs currently being evaluated, keyed by sequence number.
///
/// Cheap to clone; all clones observe the same set.
#[derive(Debug, Clone, Default)]
pub struct ActiveJobs(Arc<RwLock<BTreeMap<u64, Arc<Job>>>>);

impl ActiveJobs {
    /// Point-in-time copy, ordered by sequence number.
    pub fn snapshot(&self) -> Vec<Arc<Job>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, job: Arc<Job>) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.seq, job);
    }

    fn remove(&self, seq: u64) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).remove(&seq);
    }
}

/// Worker pool evaluating jobs with an executor `E`.
pub struct Runner<E> {
    max_workers: usize,
    executor: Arc<E>,
    active: ActiveJobs,
}

impl<E: JobExecutor> Runner<E> {
    /// A runner with at most `max_workers` (at least 1) concurrent evaluations.
    pub fn new(max_workers: usize, executor: E) -> Self {
        Self {
            max_workers: max_workers.max(1),
            executor: Arc::new(executor),
            active: ActiveJobs::default(),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Jobs currently being evaluated.
    pub fn jobs(&self) -> Vec<Arc<Job>> {
        self.active.snapshot()
    }

    /// Shared handle on the active set, for observers outside the runner.
    pub fn active(&self) -> ActiveJobs {
        self.active.clone()
    }

    /// Start consuming `jobs`. Returns the result queue.
    ///
    /// Results are queued without bound, so workers never block on a slow consumer.
    pub fn run(&self, token: CancellationToken, mut jobs: mpsc::Receiver<Job>) -> mpsc::UnboundedReceiver<JobResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        let limit = Arc::new(Semaphore::new(self.max_workers));
        let executor = self.executor.clone();
        let active = self.active.clone();

        tokio::spawn(async move {
            loop {
                let permit = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    permit = limit.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };
                let job = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    job = jobs.recv() => match job {
                        Some(job) => job,
                        None => break,
                    },
                };
                tokio::spawn(work(
                    permit,
                    Arc::new(job),
                    executor.clone(),
                    active.clone(),
                    tx.clone(),
                ));
            }
            tracing::debug!(cancelled = token.is_cancelled(), "runner stopped taking jobs");
        });
        rx
    }
}

async fn work<E: JobExecutor>(
    permit: OwnedSemaphorePermit,
    job: Arc<Job>,
    executor: Arc<E>,
    active: ActiveJobs,
    tx: mpsc::UnboundedSender<JobResult>,
) {
    active.insert(job.clone());
    // Send errors mean the consumer is gone; the job still runs to completion.
    let _ = tx.send(JobResult::new(job.clone(), Event::start()));

    // Evaluate in a separate task so a panicking executor turns into an Error event.
    let evaluation = {
        let job = job.clone();
        tokio::spawn(async move { executor.evaluate(&job).await })
    };
    let event = match evaluation.await {
        Ok(Ok(verdict)) => Event::stop(verdict),
        Ok(Err(err)) => Event::error(err.to_string()),
        Err(err) => Event::error(format!("evaluation aborted: {err}")),
    };

    active.remove(job.seq);
    let _ = tx.send(JobResult::new(job, event));
    drop(permit);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::project::Suite;
    use crate::run::{ExecError, JobFactory};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use suiterun_core::Verdict;

    /// Executor that sleeps and records peak concurrency.
    struct Probe {
        running: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl Probe {
        fn new(delay: Duration) -> Self {
            Self {
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
            }
        }
    }

    impl JobExecutor for Arc<Probe> {
        async fn evaluate(&self, job: &Job) -> Result<Verdict, ExecError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            if job.name.ends_with("panic") {
                panic!("executor blew up");
            }
            Ok(Verdict::pass())
        }
    }

    fn feed(names: &[&str]) -> mpsc::Receiver<Job> {
        let suite = Arc::new(Suite::from_manifest(".".into(), Default::default()).unwrap());
        let factory = JobFactory::new(None);
        let (tx, rx) = mpsc::channel(names.len().max(1));
        for name in names {
            tx.try_send(factory.new_job(name.to_string(), suite.clone())).unwrap();
        }
        rx
    }

    async fn drain(mut rx: mpsc::UnboundedReceiver<JobResult>) -> Vec<JobResult> {
        let mut out = Vec::new();
        while let Some(r) = rx.recv().await {
            out.push(r);
        }
        out
    }

    #[tokio::test]
    async fn each_job_starts_then_terminates_once() {
        let probe = Arc::new(Probe::new(Duration::from_millis(5)));
        let runner = Runner::new(2, probe.clone());
        let results = drain(runner.run(CancellationToken::new(), feed(&["m.a", "m.b", "m.c"]))).await;

        assert_eq!(results.len(), 6);
        for seq in 1..=3u64 {
            let events: Vec<_> = results.iter().filter(|r| r.job.seq == seq).map(|r| &r.event).collect();
            assert_eq!(events.len(), 2);
            assert!(matches!(events[0], Event::Start { .. }));
            assert!(events[1].is_pass());
        }
        assert!(runner.jobs().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded() {
        let probe = Arc::new(Probe::new(Duration::from_millis(20)));
        let runner = Runner::new(3, probe.clone());
        let names: Vec<String> = (0..12).map(|i| format!("m.t{i}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut rx = runner.run(CancellationToken::new(), feed(&names));

        let mut terminal = 0;
        while let Some(r) = rx.recv().await {
            assert!(runner.jobs().len() <= 3);
            if r.event.is_terminal() {
                terminal += 1;
            }
        }
        assert_eq!(terminal, 12);
        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
        assert!(probe.peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn panicking_executor_becomes_error_event() {
        let probe = Arc::new(Probe::new(Duration::ZERO));
        let runner = Runner::new(1, probe);
        let results = drain(runner.run(CancellationToken::new(), feed(&["m.panic", "m.ok"]))).await;

        let terminal: Vec<_> = results.iter().filter(|r| r.event.is_terminal()).collect();
        assert_eq!(terminal.len(), 2);
        assert!(matches!(&terminal[0].event, Event::Error { cause, .. } if cause.contains("aborted")));
        assert!(terminal[1].event.is_pass());
    }

    #[tokio::test]
    async fn cancelled_runner_takes_no_new_jobs() {
        let token = CancellationToken::new();
        token.cancel();
        let runner = Runner::new(2, Arc::new(Probe::new(Duration::ZERO)));
        let results = drain(runner.run(token, feed(&["m.a", "m.b"]))).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn empty_input_closes_output() {
        let runner = Runner::new(4, Arc::new(Probe::new(Duration::ZERO)));
        assert!(drain(runner.run(CancellationToken::new(), feed(&[]))).await.is_empty());
    }
}
