//! Job evaluation.
//!
//! [`JobExecutor`] is the seam between scheduling and actually running a test. The runner only needs a verdict or
//! an error back; [`CommandExecutor`] gets them by running the suite's runtime command.
//!
//! ## Runtime protocol
//!
//! The runtime is started in the job's working directory with the suite variables and `SUITERUN_TEST_ID` in its
//! environment. `{id}` in the command line is replaced by the test identifier; without a placeholder the
//! identifier is appended as last argument. The verdict is taken from the last stdout line of the form
//! `verdict: <v>` (or `verdict=<v>`). Without such a line, exit status 0 means `pass` and anything else is an
//! error.

use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use suiterun_core::Verdict;
use thiserror::Error;
use tokio::process::Command;

use super::Job;

/// Environment variable carrying the test identifier into the runtime.
pub const TEST_ID_ENV: &str = "SUITERUN_TEST_ID";

/// Placeholder replaced by the test identifier in the runtime command line.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Why a job could not produce a verdict.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no runtime configured for suite {0}")]
    NoRuntime(String),

    #[error("cannot prepare working directory {}: {source}", path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("{program} exited with {status}{}", stderr_suffix(stderr))]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => format!(": {}", line.trim()),
        None => String::new(),
    }
}

/// Evaluates one job.
///
/// Implementations must be shareable across worker tasks. A panic inside `evaluate` is reported as an `Error`
/// event for that job; it does not take the runner down.
pub trait JobExecutor: Send + Sync + 'static {
    fn evaluate(&self, job: &Job) -> impl Future<Output = Result<Verdict, ExecError>> + Send;
}

/// Runs the suite's runtime command for each job.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandExecutor;

impl JobExecutor for CommandExecutor {
    #[tracing::instrument(skip_all, fields(job = %job.name, seq = job.seq))]
    async fn evaluate(&self, job: &Job) -> Result<Verdict, ExecError> {
        let config = &job.suite.config;
        let argv = runtime_argv(&config.runtime, &job.name);
        let Some((program, args)) = argv.split_first() else {
            return Err(ExecError::NoRuntime(job.suite.name.clone()));
        };

        tokio::fs::create_dir_all(&job.dir)
            .await
            .map_err(|source| ExecError::WorkDir {
                path: job.dir.clone(),
                source,
            })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&job.dir)
            .envs(&config.variables)
            .env(TEST_ID_ENV, &job.name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!(program = %program, ?args, "starting runtime");

        let child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match config.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ExecError::Timeout(limit))?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(verdict) = parse_verdict(&stdout) {
            return Ok(verdict);
        }
        if output.status.success() {
            return Ok(Verdict::pass());
        }
        Err(ExecError::Exit {
            program: program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Substitute the test identifier into the runtime command line.
pub fn runtime_argv(runtime: &[String], id: &str) -> Vec<String> {
    if runtime.is_empty() {
        return Vec::new();
    }
    let mut argv: Vec<String> = runtime.iter().map(|a| a.replace(ID_PLACEHOLDER, id)).collect();
    if !runtime.iter().any(|a| a.contains(ID_PLACEHOLDER)) {
        argv.push(id.to_string());
    }
    argv
}

/// The verdict reported on the last `verdict:` line of `stdout`, if any.
pub fn parse_verdict(stdout: &str) -> Option<Verdict> {
    stdout.lines().rev().find_map(|line| {
        let line = line.trim();
        let prefix = line.get(..7)?;
        if !prefix.eq_ignore_ascii_case("verdict") {
            return None;
        }
        let rest = line[7..].trim_start();
        let value = rest.strip_prefix(':').or_else(|| rest.strip_prefix('='))?;
        Some(Verdict::new(value))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_substituted() {
        let rt = vec!["rt".to_string(), "--test={id}".to_string()];
        assert_eq!(runtime_argv(&rt, "m.t"), vec!["rt", "--test=m.t"]);
    }

    #[test]
    fn id_is_appended_without_placeholder() {
        let rt = vec!["rt".to_string(), "-v".to_string()];
        assert_eq!(runtime_argv(&rt, "m.t"), vec!["rt", "-v", "m.t"]);
        assert!(runtime_argv(&[], "m.t").is_empty());
    }

    #[test]
    fn last_verdict_line_wins() {
        let out = "starting\nverdict: fail\nretrying\nVerdict = Pass\ntrailer\n";
        assert_eq!(parse_verdict(out), Some(Verdict::pass()));
        assert_eq!(parse_verdict("verdict:inconc"), Some(Verdict::new("inconc")));
        assert_eq!(parse_verdict("no verdict here"), None);
        assert_eq!(parse_verdict("verdicts: 3"), None);
    }

    #[test]
    fn exit_error_mentions_last_stderr_line() {
        assert_eq!(stderr_suffix("a\nboom\n\n"), ": boom");
        assert_eq!(stderr_suffix(""), "");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::project::{Suite, SuiteConfig};
        use crate::run::JobFactory;
        use std::sync::Arc;

        fn job(dir: &std::path::Path, runtime: &[&str], timeout: Option<Duration>) -> Job {
            let mut suite = Suite::from_manifest(dir.to_path_buf(), Default::default()).unwrap();
            suite.config = SuiteConfig {
                timeout,
                runtime: runtime.iter().map(|s| s.to_string()).collect(),
                ..SuiteConfig::default()
            };
            JobFactory::new(None).new_job("m.tc".into(), Arc::new(suite))
        }

        #[tokio::test]
        async fn verdict_from_stdout() {
            let tmp = tempfile::tempdir().unwrap();
            let j = job(tmp.path(), &["sh", "-c", "echo \"verdict: inconc $SUITERUN_TEST_ID\"", "{id}"], None);
            let v = CommandExecutor.evaluate(&j).await.unwrap();
            assert_eq!(v.as_str(), "inconc m.tc");
        }

        #[tokio::test]
        async fn exit_status_decides_without_verdict_line() {
            let tmp = tempfile::tempdir().unwrap();
            let ok = job(tmp.path(), &["sh", "-c", "exit 0", "{id}"], None);
            assert!(CommandExecutor.evaluate(&ok).await.unwrap().is_pass());

            let bad = job(tmp.path(), &["sh", "-c", "echo oops >&2; exit 3", "{id}"], None);
            let err = CommandExecutor.evaluate(&bad).await.unwrap_err();
            assert!(matches!(err, ExecError::Exit { .. }));
            assert!(err.to_string().ends_with(": oops"), "{err}");
        }

        #[tokio::test]
        async fn timeout_is_an_error() {
            let tmp = tempfile::tempdir().unwrap();
            let j = job(tmp.path(), &["sh", "-c", "sleep 5", "{id}"], Some(Duration::from_millis(100)));
            let err = CommandExecutor.evaluate(&j).await.unwrap_err();
            assert!(matches!(err, ExecError::Timeout(_)));
        }

        #[tokio::test]
        async fn missing_program_is_a_spawn_error() {
            let tmp = tempfile::tempdir().unwrap();
            let j = job(tmp.path(), &["/no/such/runtime"], None);
            let err = CommandExecutor.evaluate(&j).await.unwrap_err();
            assert!(matches!(err, ExecError::Spawn { .. }));
        }

        #[tokio::test]
        async fn no_runtime_is_reported() {
            let tmp = tempfile::tempdir().unwrap();
            let j = job(tmp.path(), &[], None);
            assert!(matches!(
                CommandExecutor.evaluate(&j).await,
                Err(ExecError::NoRuntime(_))
            ));
        }
    }
}
