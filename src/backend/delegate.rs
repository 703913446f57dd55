//! Delegation to an external runner.
//!
//! The delegate is started as
//!
//! ```text
//! <program> --no-summary --results-file=<path> -j<N> [flags...] [files...]
//! ```
//!
//! and receives one test identifier per line on stdin. Its stdout and stderr are inherited. The delegate writes the
//! results database itself, so nothing is collected or persisted here.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::process::{ChildStdin, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Execute, RunError, RunOutcome};
use crate::results::ResultsFile;
use crate::run::Job;

/// Hands the run to an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateBackend {
    program: PathBuf,
    max_workers: usize,
    results: ResultsFile,
    flags: Vec<String>,
    files: Vec<PathBuf>,
}

impl DelegateBackend {
    pub fn new(program: PathBuf, max_workers: usize, results: ResultsFile) -> Self {
        Self {
            program,
            max_workers: max_workers.max(1),
            results,
            flags: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Extra flags placed before the file arguments.
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    /// Files passed as trailing arguments.
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    /// Arguments of the delegate command line, program excluded.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-summary".to_string(),
            format!("--results-file={}", self.results.path().display()),
            format!("-j{}", self.max_workers),
        ];
        args.extend(self.flags.iter().cloned());
        args.extend(self.files.iter().map(|f| f.display().to_string()));
        args
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Execute for DelegateBackend {
    #[tracing::instrument(skip_all, fields(program = %self.program.display()))]
    async fn execute(self, token: CancellationToken, jobs: mpsc::Receiver<Job>) -> Result<RunOutcome, RunError> {
        let args = self.args();
        tracing::debug!(?args, "starting delegate");
        let io_err = |source| RunError::DelegateIo {
            program: self.program_name(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(io_err)?;

        let feeder = child.stdin.take().map(|stdin| tokio::spawn(feed(stdin, jobs)));

        let status = tokio::select! {
            status = child.wait() => status.map_err(io_err)?,
            () = token.cancelled() => {
                tracing::info!("run cancelled, stopping delegate");
                // Kill fails only if the child already exited; wait reports either way.
                let _ = child.start_kill();
                child.wait().await.map_err(io_err)?
            }
        };

        if let Some(feeder) = feeder {
            feeder.abort();
            if let Ok(Err(err)) = feeder.await {
                tracing::debug!(error = %err, "delegate stopped reading identifiers");
            }
        }

        if status.success() {
            Ok(RunOutcome::default())
        } else {
            Err(RunError::Delegate {
                program: self.program_name(),
                status,
            })
        }
    }
}

/// Write one identifier per line, then close stdin.
async fn feed(stdin: ChildStdin, mut jobs: mpsc::Receiver<Job>) -> std::io::Result<()> {
    let mut out = BufWriter::new(stdin);
    while let Some(job) = jobs.recv().await {
        out.write_all(job.name.as_bytes()).await?;
        out.write_all(b"\n").await?;
        // Keep the delegate busy while the generator is still parsing.
        if jobs.is_empty() {
            out.flush().await?;
        }
    }
    out.flush().await?;
    out.shutdown().await
}
