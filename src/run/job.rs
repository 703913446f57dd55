//! Job records.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::project::Suite;

/// One unit of work: a test identifier bound to its suite.
///
/// `seq` is unique within a run and strictly increasing in creation order.
#[derive(Debug, Clone)]
pub struct Job {
    pub seq: u64,
    /// Test identifier, e.g. `module.testcase`.
    pub name: String,
    pub suite: Arc<Suite>,
    /// Working directory of the job.
    pub dir: PathBuf,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.name == other.name
    }
}

/// Creates jobs with run-unique sequence numbers.
///
/// Creating a job performs no I/O; the executor prepares the working directory.
#[derive(Debug, Default)]
pub struct JobFactory {
    next: AtomicU64,
    output_dir: Option<PathBuf>,
}

impl JobFactory {
    /// Jobs run in their suite root, or in `<output_dir>/<id>` when an output directory is given.
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self {
            next: AtomicU64::new(0),
            output_dir,
        }
    }

    pub fn new_job(&self, id: String, suite: Arc<Suite>) -> Job {
        let seq = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let dir = match &self.output_dir {
            Some(out) => out.join(dir_name(&id)),
            None => suite.root.clone(),
        };
        Job {
            seq,
            name: id,
            suite,
            dir,
        }
    }
}

/// File-system safe directory name for a test identifier.
fn dir_name(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
