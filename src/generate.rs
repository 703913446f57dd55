//! Identifier and job generation.
//!
//! [`generate_ids`] produces the test identifiers of a run on a channel with a single slot, so parsing advances only
//! as fast as jobs are consumed. [`generate_jobs`] turns identifiers into [`Job`]s through a buffer the size of the
//! worker pool. Both stages stop early when the run is cancelled or the consumer goes away.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::basket::Selector;
use crate::parse_cache::ParseCache;
use crate::project::Suite;
use crate::run::{Job, JobFactory};

/// Which definitions become test identifiers when none are given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Every selected test case.
    #[default]
    Tests,
    /// Every control part (legacy behaviour, requested with `old`).
    Controls,
}

impl RunPolicy {
    /// Interpret a policy setting: `old` selects control parts, anything else test cases.
    pub fn from_setting(setting: Option<&str>) -> RunPolicy {
        match setting.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("old") => RunPolicy::Controls,
            _ => RunPolicy::Tests,
        }
    }
}

/// Where identifiers come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// Identifiers given by the user, in order. Sources are not parsed.
    Explicit(Vec<String>),
    /// `<module>.control` for every control part in the files.
    Controls(Vec<PathBuf>),
    /// `<module>.<testcase>` for every test case in the files that the selector accepts.
    Tests(Vec<PathBuf>),
}

impl IdSource {
    /// Explicit identifiers win; otherwise the policy decides.
    pub fn select(ids: Vec<String>, files: Vec<PathBuf>, policy: RunPolicy) -> IdSource {
        if !ids.is_empty() {
            return IdSource::Explicit(ids);
        }
        match policy {
            RunPolicy::Controls => IdSource::Controls(files),
            RunPolicy::Tests => IdSource::Tests(files),
        }
    }
}

/// Start generating identifiers.
///
/// Files that fail to parse are skipped with a warning. Each identifier is emitted at most once per definition, in
/// file order, then definition order.
pub fn generate_ids(
    token: CancellationToken,
    source: IdSource,
    selector: Arc<dyn Selector>,
    cache: Arc<ParseCache>,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut count = 0usize;
        let (files, controls) = match source {
            IdSource::Explicit(ids) => {
                for id in ids {
                    if !emit(&token, &tx, id).await {
                        return;
                    }
                    count += 1;
                }
                tracing::debug!(count, "identifier generation finished");
                return;
            }
            IdSource::Controls(files) => (files, true),
            IdSource::Tests(files) => (files, false),
        };

        for file in files {
            let tree = tokio::select! {
                biased;
                () = token.cancelled() => return,
                tree = cache.get(&file) => tree,
            };
            let Some(defs) = tree.definitions() else {
                tracing::warn!(
                    file = %file.display(),
                    "skipping file that failed to parse:\n{}",
                    tree.describe_error().unwrap_or_default()
                );
                continue;
            };

            let candidates: Vec<_> = if controls {
                defs.controls().collect()
            } else {
                defs.tests().collect()
            };
            let ids: Vec<String> = candidates
                .into_iter()
                .map(|d| (d.qualified_name(), &d.tags))
                .filter(|(id, tags)| selector.matches(id, tags))
                .map(|(id, _)| id)
                .collect();
            for id in ids {
                if !emit(&token, &tx, id).await {
                    return;
                }
                count += 1;
            }
        }
        tracing::debug!(count, "identifier generation finished");
    });
    rx
}

/// Send `item`, giving up when the run is cancelled or the receiver is gone.
async fn emit<T>(token: &CancellationToken, tx: &mpsc::Sender<T>, item: T) -> bool {
    tokio::select! {
        biased;
        () = token.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

/// Turn identifiers into jobs, buffering up to `buffer` of them.
pub fn generate_jobs(
    token: CancellationToken,
    mut ids: mpsc::Receiver<String>,
    suite: Arc<Suite>,
    factory: JobFactory,
    buffer: usize,
) -> mpsc::Receiver<Job> {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    tokio::spawn(async move {
        loop {
            let id = tokio::select! {
                biased;
                () = token.cancelled() => break,
                id = ids.recv() => match id {
                    Some(id) => id,
                    None => break,
                },
            };
            let job = factory.new_job(id, suite.clone());
            if !emit(&token, &tx, job).await {
                break;
            }
        }
    });
    rx
}
