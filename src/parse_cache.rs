//! Content-addressed parse cache.
//!
//! Source files are parsed at most once per content: entries are keyed by path and a SHA-256 digest of the bytes,
//! so an edited file is parsed again while an unchanged one is shared by every caller. Concurrent requests for the
//! same entry wait for a single parse. Parse failures are cached like successes.
//!
//! Parsing is CPU bound and runs on the blocking pool. A semaphore sized to the host parallelism bounds the number
//! of parses in flight across the whole process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use sha2::{Digest, Sha256};
use suiterun_syntax::{Definitions, SyntaxError};
use thiserror::Error;
use tokio::sync::{OnceCell, Semaphore};

/// Why a file has no definitions.
#[derive(Debug, Clone, Error)]
pub enum TreeError {
    #[error("cannot read file: {0}")]
    Read(String),

    #[error("{} syntax error(s)", .0.len())]
    Syntax(Vec<SyntaxError>),

    #[error("parser aborted: {0}")]
    Aborted(String),
}

/// Result of parsing one file.
#[derive(Debug)]
pub struct Tree {
    pub path: PathBuf,
    pub source: String,
    pub result: Result<Definitions, TreeError>,
}

impl Tree {
    fn unreadable(path: &Path, err: std::io::Error) -> Tree {
        Tree {
            path: path.to_path_buf(),
            source: String::new(),
            result: Err(TreeError::Read(err.to_string())),
        }
    }

    pub fn definitions(&self) -> Option<&Definitions> {
        self.result.as_ref().ok()
    }

    /// Render the failure, with source snippets for syntax errors.
    pub fn describe_error(&self) -> Option<String> {
        let err = self.result.as_ref().err()?;
        let file = self.path.display().to_string();
        Some(match err {
            TreeError::Syntax(errors) => errors
                .iter()
                .map(|e| format!("{:?}", e.to_report(&file, &self.source)))
                .collect::<Vec<_>>()
                .join("\n"),
            other => format!("{file}: {other}"),
        })
    }
}

type Digest256 = [u8; 32];

struct Entry {
    digest: Digest256,
    cell: Arc<OnceCell<Arc<Tree>>>,
}

/// Memoizing, concurrency-bounded parser front end.
pub struct ParseCache {
    entries: Mutex<HashMap<PathBuf, Entry>>,
    limit: Arc<Semaphore>,
}

static SHARED: OnceLock<Arc<ParseCache>> = OnceLock::new();

impl ParseCache {
    /// A cache allowing at most `max_parallel` parses at once.
    pub fn new(max_parallel: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            limit: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    /// The process-wide cache, sized to the available parallelism.
    pub fn shared() -> Arc<ParseCache> {
        SHARED
            .get_or_init(|| Arc::new(ParseCache::new(host_parallelism())))
            .clone()
    }

    /// Number of files currently cached.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse `path`, or return the cached tree for its current content.
    ///
    /// Never fails: read and parse errors are reported inside the returned [`Tree`].
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn get(&self, path: &Path) -> Arc<Tree> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => return Arc::new(Tree::unreadable(path, err)),
        };
        let digest: Digest256 = Sha256::digest(&bytes).into();
        let cell = self.cell_for(path, digest);

        if let Some(tree) = cell.get() {
            tracing::debug!("parse cache hit");
            return tree.clone();
        }

        cell.get_or_init(|| async {
            // The semaphore is never closed; a failed acquire just means no bound.
            let _permit = self.limit.acquire().await.ok();
            let source = String::from_utf8_lossy(&bytes).into_owned();
            parse_blocking(path.to_path_buf(), source).await
        })
        .await
        .clone()
    }

    fn cell_for(&self, path: &Path, digest: Digest256) -> Arc<OnceCell<Arc<Tree>>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(path) {
            Some(entry) if entry.digest == digest => entry.cell.clone(),
            _ => {
                let cell = Arc::new(OnceCell::new());
                entries.insert(
                    path.to_path_buf(),
                    Entry {
                        digest,
                        cell: cell.clone(),
                    },
                );
                cell
            }
        }
    }
}

async fn parse_blocking(path: PathBuf, source: String) -> Arc<Tree> {
    let task_path = path.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let result = suiterun_syntax::parse(&source).map_err(TreeError::Syntax);
        Tree {
            path: task_path,
            source,
            result,
        }
    })
    .await;

    let tree = joined.unwrap_or_else(|err| Tree {
        path,
        source: String::new(),
        result: Err(TreeError::Aborted(err.to_string())),
    });
    tracing::debug!(
        path = %tree.path.display(),
        ok = tree.result.is_ok(),
        "parsed source file"
    );
    Arc::new(tree)
}

/// Available parallelism of the host, at least 1.
pub fn host_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_content_is_parsed_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.ttcn3");
        std::fs::write(&path, "module a { testcase t() {} }").unwrap();

        let cache = ParseCache::new(2);
        let first = cache.get(&path).await;
        let second = cache.get(&path).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.definitions().unwrap().tests().count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn edited_file_is_parsed_again() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.ttcn3");
        std::fs::write(&path, "module a { testcase t() {} }").unwrap();

        let cache = ParseCache::new(1);
        let before = cache.get(&path).await;
        std::fs::write(&path, "module a { testcase t() {} testcase u() {} }").unwrap();
        let after = cache.get(&path).await;
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.definitions().unwrap().tests().count(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_share_one_parse() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.ttcn3");
        std::fs::write(&path, "module a { control {} }").unwrap();

        let cache = Arc::new(ParseCache::new(4));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let path = path.clone();
                tokio::spawn(async move { cache.get(&path).await })
            })
            .collect();
        let mut trees = Vec::new();
        for h in handles {
            trees.push(h.await.unwrap());
        }
        assert!(trees.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[tokio::test]
    async fn failures_are_cached_and_described() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.ttcn3");
        std::fs::write(&path, "module bad { testcase t() {").unwrap();

        let cache = ParseCache::new(1);
        let first = cache.get(&path).await;
        assert!(matches!(first.result, Err(TreeError::Syntax(_))));
        assert!(first.describe_error().unwrap().contains("unclosed"));
        assert!(Arc::ptr_eq(&first, &cache.get(&path).await));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let cache = ParseCache::new(1);
        let tree = cache.get(Path::new("/definitely/not/here.ttcn3")).await;
        assert!(matches!(tree.result, Err(TreeError::Read(_))));
        assert!(cache.is_empty());
    }
}
