//! Suite configuration.
//!
//! A suite is described by a `package.yml` manifest. The manifest names the TTCN-3 sources, the runtime command
//! that executes one test, per-test settings and named baskets:
//!
//! ```yaml
//! name: demo
//! sources: [src, lib/common.ttcn3]
//! timeout: 30
//! runtime: ./run-test {id}
//! variables:
//!   SUT_ADDR: 10.0.0.1
//! baskets:
//!   smoke: { tags_regex: ["smoke"] }
//! ```

pub mod discover;
pub mod manifest;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use walkdir::WalkDir;

pub use discover::find_manifest;
pub use manifest::{BasketSpec, Manifest};

/// File name of the suite manifest.
pub const MANIFEST_NAME: &str = "package.yml";

/// File extensions recognised as TTCN-3 sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["ttcn3", "ttcn", "ttcnpp"];

/// Errors raised while resolving or loading a suite.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {MANIFEST_NAME} found in {} or any parent directory", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("source {} does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("cannot scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid timeout {0}: must be a positive number of seconds")]
    Timeout(f64),
}

/// Per-test execution settings taken from the manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuiteConfig {
    /// Upper bound for one test execution.
    pub timeout: Option<Duration>,
    /// Environment variables passed to every test.
    pub variables: BTreeMap<String, String>,
    /// Runtime command line. `{id}` is replaced by the test identifier.
    pub runtime: Vec<String>,
    /// Named baskets, selectable with `--baskets`.
    pub baskets: BTreeMap<String, BasketSpec>,
}

/// A resolved suite: manifest location, sources and configuration.
///
/// Shared by all jobs of a run behind an `Arc`; never mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub name: String,
    /// Directory containing the manifest. Relative paths in the manifest are resolved against it.
    pub root: PathBuf,
    /// Source paths as listed in the manifest, resolved against `root`. Directories are expanded by
    /// [`Suite::source_files`].
    pub sources: Vec<PathBuf>,
    pub config: SuiteConfig,
}

impl Suite {
    /// Find the manifest for `path` and load it.
    ///
    /// `path` may be the manifest itself, a directory containing it, or any file or directory below the suite
    /// root.
    ///
    /// ## Errors
    /// [`ConfigError::NotFound`] when no manifest exists in `path` or any of its ancestors.
    pub fn resolve(path: &Path) -> Result<Suite, ConfigError> {
        let manifest_path = find_manifest(path)?;
        Self::load(&manifest_path)
    }

    /// Load the manifest at `manifest_path`.
    pub fn load(manifest_path: &Path) -> Result<Suite, ConfigError> {
        let text = std::fs::read_to_string(manifest_path).map_err(|source| ConfigError::Read {
            path: manifest_path.to_path_buf(),
            source,
        })?;
        let manifest = Manifest::from_yaml(&text).map_err(|source| ConfigError::Malformed {
            path: manifest_path.to_path_buf(),
            source,
        })?;
        let root = manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_manifest(root, manifest)
    }

    /// Build a suite from an already parsed manifest located in `root`.
    pub fn from_manifest(root: PathBuf, manifest: Manifest) -> Result<Suite, ConfigError> {
        let timeout = match manifest.timeout {
            None => None,
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => return Err(ConfigError::Timeout(secs)),
        };
        let name = manifest.name.clone().unwrap_or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "suite".to_string())
        });
        let sources = manifest.sources.iter().map(|s| root.join(s)).collect();
        let config = SuiteConfig {
            timeout,
            variables: manifest.variables(),
            runtime: manifest.runtime_argv(),
            baskets: manifest.baskets,
        };
        tracing::debug!(suite = %name, root = %root.display(), "loaded suite manifest");
        Ok(Suite {
            name,
            root,
            sources,
            config,
        })
    }

    /// All TTCN-3 files of the suite, in manifest order.
    ///
    /// Directories are expanded recursively; their files are sorted by path so the resulting order is
    /// deterministic. Explicitly listed files are kept even if their extension is unusual.
    ///
    /// ## Errors
    /// [`ConfigError::MissingSource`] when a listed source does not exist.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        expand_sources(&self.sources)
    }
}

/// Expand a list of files and directories into TTCN-3 files.
pub fn expand_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(|source| ConfigError::Walk {
                    path: path.clone(),
                    source,
                })?;
                if entry.file_type().is_file() && is_ttcn3_file(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            return Err(ConfigError::MissingSource(path.clone()));
        }
    }
    Ok(files)
}

/// Whether `path` has a TTCN-3 source extension.
pub fn is_ttcn3_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}
