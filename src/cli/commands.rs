//! Command implementations.
//!
//! Both commands share the front half of the pipeline: resolve the suite, build the basket and start the identifier
//! generator. `run` then hands the job stream to a backend; `list` prints the identifiers.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{CliError, CliResult, ExitCode, RunArgs, SelectArgs};
use crate::backend::{Backend, BackendKind, DelegateBackend, Execute, LocalBackend, LocalOptions};
use crate::basket::Basket;
use crate::collect::ConsoleReporter;
use crate::generate::{IdSource, RunPolicy, generate_ids, generate_jobs};
use crate::parse_cache::ParseCache;
use crate::project::{BasketSpec, Suite};
use crate::results::ResultsFile;
use crate::run::{CommandExecutor, JobFactory};
use crate::signal;

/// `suiterun run`
pub async fn run_tests<X>(args: RunArgs, force_exit: X) -> CliResult<ExitCode>
where
    X: FnOnce() + Send + 'static,
{
    if args.no_color {
        colored::control::set_override(false);
    }
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| CliError::failure(format!("Error: cannot create {}: {e}", dir.display())))?;
    }

    let token = CancellationToken::new();
    let _interrupts = signal::spawn_interrupt_handler(token.clone(), force_exit);

    let suite = Arc::new(resolve_suite(&args.select.paths)?);
    let ids = start_ids(&args.select, &suite, token.clone())?;
    let jobs = generate_jobs(
        token.clone(),
        ids,
        suite.clone(),
        JobFactory::new(args.output_dir.clone()),
        args.jobs,
    );

    let results = ResultsFile::from_env();
    let backend = match BackendKind::from_setting(args.delegate.as_deref()) {
        BackendKind::Local => Backend::Local(LocalBackend::new(
            CommandExecutor,
            Box::new(ConsoleReporter::stdout(args.format)),
            LocalOptions {
                max_workers: args.jobs,
                max_fail: args.max_fail,
                ticker: Duration::from_secs(args.ticker.max(1)),
            },
            results,
        )),
        BackendKind::Delegate(program) => {
            let flags = args
                .delegate_flags
                .as_deref()
                .map(|f| f.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            let files = if args.select.paths.is_empty() {
                suite.sources.clone()
            } else {
                args.select.paths.clone()
            };
            Backend::Delegate(
                DelegateBackend::new(program, args.jobs, results)
                    .with_flags(flags)
                    .with_files(files),
            )
        }
    };

    backend
        .execute(token, jobs)
        .await
        .map(|_| ExitCode::SUCCESS)
        .map_err(|e| CliError::failure(e.to_string()))
}

/// `suiterun list`
pub async fn list_tests(args: SelectArgs) -> CliResult<ExitCode> {
    let token = CancellationToken::new();
    let suite = resolve_suite(&args.paths)?;
    let mut ids = start_ids(&args, &suite, token)?;
    while let Some(id) = ids.recv().await {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Load the suite governing the first path (or the current directory).
fn resolve_suite(paths: &[PathBuf]) -> CliResult<Suite> {
    let start = paths.first().map(PathBuf::as_path).unwrap_or(Path::new("."));
    Suite::resolve(start).map_err(|e| CliError::failure(format!("Error: {e}")))
}

/// Build the selection for `args` and start the identifier generator.
fn start_ids(args: &SelectArgs, suite: &Suite, token: CancellationToken) -> CliResult<mpsc::Receiver<String>> {
    let basket = build_basket(args, suite)?;
    let mut ids = match &args.tests_file {
        Some(path) => read_tests_file(path)?,
        None => Vec::new(),
    };
    ids.extend(args.ids.iter().cloned());

    let files = if ids.is_empty() {
        suite
            .source_files()
            .map_err(|e| CliError::failure(format!("Error: {e}")))?
    } else {
        Vec::new()
    };
    let source = IdSource::select(ids, files, RunPolicy::from_setting(args.policy.as_deref()));
    Ok(generate_ids(token, source, Arc::new(basket), ParseCache::shared()))
}

fn build_basket(args: &SelectArgs, suite: &Suite) -> CliResult<Basket> {
    let spec = BasketSpec {
        tests_regex: args.run_pattern.clone(),
        exclude: args.exclude.clone(),
        tags_regex: args.tags_regex.clone(),
        exclude_tags: args.exclude_tags.clone(),
    };
    Basket::new("default", &spec)
        .and_then(|b| b.with_sub_baskets(&args.baskets, &suite.config.baskets))
        .map_err(|e| CliError::failure(format!("Error: {e}")))
}

/// Read identifiers from `path`, or stdin for `-`.
pub fn read_tests_file(path: &Path) -> CliResult<Vec<String>> {
    let reader: Box<dyn Read> = if path == Path::new("-") {
        Box::new(std::io::stdin())
    } else {
        Box::new(
            std::fs::File::open(path)
                .map_err(|e| CliError::failure(format!("Error: cannot open {}: {e}", path.display())))?,
        )
    };
    parse_ids(BufReader::new(reader))
        .map_err(|e| CliError::failure(format!("Error: cannot read {}: {e}", path.display())))
}

/// One identifier per line; lines are trimmed and blank lines are ignored.
fn parse_ids(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            ids.push(line.to_string());
        }
    }
    Ok(ids)
}
