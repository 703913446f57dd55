//! Results database.
//!
//! At the end of a local run all completed runs are written to a JSON file:
//!
//! ```json
//! {"version":"1","sessions":[{"id":"1","maxJobs":8,"expectedVerdict":"pass","runs":[
//!   {"name":"m.tc","verdict":"pass","begin":"2024-05-01T10:00:00Z","end":"2024-05-01T10:00:02Z","workingDir":"."}
//! ]}]}
//! ```
//!
//! The file from a previous run is removed before the new run starts, so a crashed run never leaves stale results
//! behind. The final write goes to a temporary file that is then renamed over the target.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use suiterun_core::verdict;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::run::{Event, JobResult};

/// Schema version written to `RunDb::version`.
pub const RUN_DB_VERSION: &str = "1";

/// Results file name.
pub const RESULTS_FILE: &str = "test_results.json";

/// Environment variable naming the cache directory that holds the results file.
pub const CACHE_DIR_ENV: &str = "SUITERUN_CACHE";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot remove stale results {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write results {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read results {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outcome of one completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub name: String,
    pub verdict: String,
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub working_dir: PathBuf,
    /// Error description for jobs that could not be evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Run {
    /// Build the run record for a terminal result. Returns `None` for `Start` events.
    pub fn from_result(result: &JobResult, begin: DateTime<Utc>) -> Option<Run> {
        let (verdict, reason) = match &result.event {
            Event::Start { .. } => return None,
            Event::Stop { verdict, .. } => (verdict.to_string(), None),
            Event::Error { cause, .. } => (verdict::FATAL.to_string(), Some(cause.clone())),
        };
        Some(Run {
            name: result.job.name.clone(),
            verdict,
            begin,
            end: result.event.time(),
            working_dir: result.job.dir.clone(),
            reason,
        })
    }

    /// Wall-clock duration, zero if the clock went backwards.
    pub fn duration(&self) -> Duration {
        (self.end - self.begin).to_std().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub max_jobs: usize,
    pub expected_verdict: String,
    pub runs: Vec<Run>,
}

/// Top-level results document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDb {
    pub version: String,
    pub sessions: Vec<Session>,
}

impl RunDb {
    /// A document with a single session holding `runs`.
    pub fn single_session(max_jobs: usize, runs: Vec<Run>) -> RunDb {
        RunDb {
            version: RUN_DB_VERSION.to_string(),
            sessions: vec![Session {
                id: "1".to_string(),
                max_jobs,
                expected_verdict: verdict::PASS.to_string(),
                runs,
            }],
        }
    }
}

/// Location of the results database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$SUITERUN_CACHE/test_results.json`, or `test_results.json` in the current directory.
    pub fn from_env() -> Self {
        Self::in_cache_dir(std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from).as_deref())
    }

    fn in_cache_dir(cache: Option<&Path>) -> Self {
        match cache.filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => Self::at(dir.join(RESULTS_FILE)),
            None => Self::at(RESULTS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete results left by a previous run. A missing file is fine.
    pub fn remove_stale(&self) -> Result<(), PersistError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "removed stale results");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Atomically replace the results file with `db`.
    pub fn write(&self, db: &RunDb) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(db)?;
        let write_err = |source| PersistError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_err)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::debug!(
            path = %self.path.display(),
            runs = db.sessions.iter().map(|s| s.runs.len()).sum::<usize>(),
            "wrote results"
        );
        Ok(())
    }

    pub fn read(&self) -> Result<RunDb, PersistError> {
        let bytes = std::fs::read(&self.path).map_err(|source| PersistError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
