//! Job lifecycle events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use suiterun_core::Verdict;

use super::Job;

/// What happened to a job.
///
/// Every job produces exactly one `Start` followed by exactly one terminal event (`Stop` or `Error`).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start { time: DateTime<Utc> },
    Stop { verdict: Verdict, time: DateTime<Utc> },
    Error { cause: String, time: DateTime<Utc> },
}

impl Event {
    pub fn start() -> Self {
        Event::Start { time: Utc::now() }
    }

    pub fn stop(verdict: Verdict) -> Self {
        Event::Stop {
            verdict,
            time: Utc::now(),
        }
    }

    pub fn error(cause: impl Into<String>) -> Self {
        Event::Error {
            cause: cause.into(),
            time: Utc::now(),
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Event::Start { time } | Event::Stop { time, .. } | Event::Error { time, .. } => *time,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Event::Start { .. })
    }

    /// A `Stop` with verdict `pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Event::Stop { verdict, .. } if verdict.is_pass())
    }
}

/// An event attributed to its job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job: Arc<Job>,
    pub event: Event,
}

impl JobResult {
    pub fn new(job: Arc<Job>, event: Event) -> Self {
        Self { job, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pass_stop_is_success() {
        assert!(Event::stop(Verdict::pass()).is_pass());
        assert!(!Event::stop(Verdict::new("inconc")).is_pass());
        assert!(!Event::error("boom").is_pass());
        assert!(!Event::start().is_pass());
    }

    #[test]
    fn terminal_events() {
        assert!(!Event::start().is_terminal());
        assert!(Event::stop(Verdict::fail()).is_terminal());
        assert!(Event::error("x").is_terminal());
    }
}
