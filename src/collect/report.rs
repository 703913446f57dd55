//! Result reporting.
//!
//! The aggregation loop uses a `Reporter` trait to separate bookkeeping from output. The default
//! `ConsoleReporter` writes one line per completed job in one of several formats; custom reporters can be added by
//! implementing the trait.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use colored::Colorize;
use suiterun_core::{VerdictClass, verdict};

use crate::results::Run;
use crate::run::Job;

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// No per-result output.
    Quiet,
    /// `<verdict>\t<name>\t<seconds>`
    Plain,
    /// One JSON run record per line.
    Json,
    /// Human readable, with progress and active-job lines.
    #[default]
    Text,
}

/// Trait for reporting run progress.
///
/// Implement this trait to customize output. `on_complete` is called exactly once per finished job.
pub trait Reporter {
    /// Called when a job starts.
    fn on_start(&mut self, _job: &Job) {}

    /// Called when a job finishes, with its record and duration.
    fn on_complete(&mut self, run: &Run, duration: Duration);

    /// Called periodically when no result arrived for a while.
    fn on_idle(&mut self, _active: &[Arc<Job>]) {}

    /// Called once when the run is aborted.
    fn on_fatal(&mut self, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn on_start(&mut self, job: &Job) {
        (**self).on_start(job)
    }

    fn on_complete(&mut self, run: &Run, duration: Duration) {
        (**self).on_complete(run, duration)
    }

    fn on_idle(&mut self, active: &[Arc<Job>]) {
        (**self).on_idle(active)
    }

    fn on_fatal(&mut self, message: &str) {
        (**self).on_fatal(message)
    }
}

/// Writes report lines to a stream (stdout by default).
pub struct ConsoleReporter<W: Write = std::io::Stdout> {
    format: OutputFormat,
    color: bool,
    out: W,
}

impl ConsoleReporter {
    /// Report to stdout. Colors follow the `colored` crate's global setting.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, std::io::stdout(), true)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(format: OutputFormat, out: W, color: bool) -> Self {
        Self { format, color, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        // A closed stdout must not abort the run.
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }

    fn paint(&self, line: String, class: VerdictClass) -> String {
        if !self.color {
            return line;
        }
        match class {
            VerdictClass::Success => line,
            VerdictClass::Warning => line.yellow().to_string(),
            VerdictClass::Failure => line.red().bold().to_string(),
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_start(&mut self, job: &Job) {
        if self.format == OutputFormat::Text {
            self.emit(&format!("=== RUN {}", job.name));
        }
    }

    fn on_complete(&mut self, run: &Run, duration: Duration) {
        let Some(line) = render_run(self.format, run, duration) else {
            return;
        };
        let line = self.paint(line, verdict::classify(&run.verdict));
        self.emit(&line);
    }

    fn on_idle(&mut self, active: &[Arc<Job>]) {
        if self.format != OutputFormat::Text {
            return;
        }
        for job in active {
            self.emit(&format!("... active {}", job.name));
        }
    }

    fn on_fatal(&mut self, message: &str) {
        let line = self.paint(format!("+++ fatal {message}"), VerdictClass::Failure);
        self.emit(&line);
    }
}

/// The line printed for a finished job, or `None` when the format prints nothing.
pub fn render_run(format: OutputFormat, run: &Run, duration: Duration) -> Option<String> {
    match format {
        OutputFormat::Quiet => None,
        OutputFormat::Plain => Some(format!("{}\t{}\t{:.4}", run.verdict, run.name, duration.as_secs_f64())),
        OutputFormat::Json => serde_json::to_string(run).ok(),
        OutputFormat::Text => Some(match &run.reason {
            Some(reason) => format!("+++ {} {}\t({})", run.verdict, run.name, reason),
            None => format!(
                "--- {} {}\t(duration={:.2}s)",
                run.verdict,
                run.name,
                duration.as_secs_f64()
            ),
        }),
    }
}
