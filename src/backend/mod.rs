//! Execution backends.
//!
//! A backend takes the job stream of a run and executes it. Exactly one backend is chosen at startup:
//!
//! - `LocalBackend` - worker pool, live reporting and results database in this process
//! - `DelegateBackend` - hands the test identifiers to an external runner over stdin

mod delegate;
mod local;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::results::PersistError;
use crate::run::Job;

pub use delegate::DelegateBackend;
pub use local::{LocalBackend, LocalOptions};

/// Program used when delegation is switched on without naming a program.
pub const DEFAULT_DELEGATE: &str = "k3s";

/// Why a run did not succeed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("command failed: {count} error(s) occurred")]
    Failed { count: u64 },

    #[error("command failed: too many errors ({count})")]
    TooManyFailures { count: u64 },

    #[error("delegate {program} failed: {status}")]
    Delegate { program: String, status: ExitStatus },

    #[error("cannot run delegate {program}: {source}")]
    DelegateIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Totals of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOutcome {
    /// Completed jobs; unknown (0) for delegated runs.
    pub runs: usize,
    pub errors: u64,
}

/// Executes the jobs of a run.
pub trait Execute {
    fn execute(
        self,
        token: CancellationToken,
        jobs: mpsc::Receiver<Job>,
    ) -> impl Future<Output = Result<RunOutcome, RunError>> + Send;
}

/// Which backend a setting asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Delegate(PathBuf),
}

impl BackendKind {
    /// Interpret a delegation setting.
    ///
    /// Unset, empty, `off`, `false`, `0` and `local` keep execution in-process; `on`, `true` and `1` delegate to
    /// the default program; anything else is taken as the delegate program path.
    pub fn from_setting(setting: Option<&str>) -> BackendKind {
        let Some(value) = setting.map(str::trim).filter(|s| !s.is_empty()) else {
            return BackendKind::Local;
        };
        match value.to_ascii_lowercase().as_str() {
            "off" | "false" | "0" | "local" | "no" => BackendKind::Local,
            "on" | "true" | "1" | "yes" => BackendKind::Delegate(PathBuf::from(DEFAULT_DELEGATE)),
            _ => BackendKind::Delegate(PathBuf::from(value)),
        }
    }
}

/// The backend chosen for a run.
pub enum Backend {
    Local(LocalBackend<crate::run::CommandExecutor>),
    Delegate(DelegateBackend),
}

impl Execute for Backend {
    async fn execute(self, token: CancellationToken, jobs: mpsc::Receiver<Job>) -> Result<RunOutcome, RunError> {
        match self {
            Backend::Local(b) => b.execute(token, jobs).await,
            Backend::Delegate(b) => b.execute(token, jobs).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegate_setting() {
        assert_eq!(BackendKind::from_setting(None), BackendKind::Local);
        assert_eq!(BackendKind::from_setting(Some("")), BackendKind::Local);
        assert_eq!(BackendKind::from_setting(Some("off")), BackendKind::Local);
        assert_eq!(BackendKind::from_setting(Some("Local")), BackendKind::Local);
        assert_eq!(
            BackendKind::from_setting(Some("on")),
            BackendKind::Delegate(PathBuf::from(DEFAULT_DELEGATE))
        );
        assert_eq!(
            BackendKind::from_setting(Some("/opt/bin/runner")),
            BackendKind::Delegate(PathBuf::from("/opt/bin/runner"))
        );
    }

    #[test]
    fn failure_messages() {
        assert_eq!(RunError::Failed { count: 3 }.to_string(), "command failed: 3 error(s) occurred");
    }
}
