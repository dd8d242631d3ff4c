//! One complete run: claim the output directory, execute the graph, commit or
//! roll back, and describe the result.

use chrono::Local;
use std::time::Instant;

use super::core::{CommandFactory, JobKind, RunConfig, format_cmd};
use super::graph::JobGraph;
use super::monitor::CancelToken;
use super::report::{RunResult, collect_artifacts};
use super::transaction::OutputTransaction;
use super::worker::{EngineSettings, Executor};
use crate::error::{Error, Result};

/// Execute every enabled job for `run`.
///
/// The output directory is created up front and only survives when every job
/// succeeded. On any error it has already been removed when this returns.
pub fn run(
    config: &RunConfig,
    settings: &EngineSettings,
    factory: &dyn CommandFactory,
    optimizer_available: bool,
    cancel: CancelToken,
) -> Result<RunResult> {
    let started_at = Local::now();
    let clock = Instant::now();

    let txn = OutputTransaction::begin(config.output_dir())?;
    let mut graph = JobGraph::build(config, optimizer_available);
    tracing::info!(
        "{} job(s) for {} into {}",
        graph.len(),
        config.name(),
        txn.path().display()
    );

    let executor = Executor::new(factory, settings, cancel);
    if let Err(err) = executor.execute(config, &mut graph) {
        let dir = txn.path().to_path_buf();
        return match txn.rollback() {
            Ok(()) => {
                tracing::error!("removed output directory {}", dir.display());
                Err(err)
            }
            Err(e) => {
                tracing::error!("Failed to remove {}: {}", dir.display(), e);
                Err(Error::RollbackFailed {
                    cause: Box::new(err),
                    dir,
                    source: e,
                })
            }
        };
    }

    let output_dir = txn.commit();
    Ok(RunResult {
        input_path: config.input_path().to_path_buf(),
        output_dir,
        has_audio: config.has_audio(),
        enabled: *config.enabled(),
        artifacts: collect_artifacts(config),
        jobs: graph.into_jobs(),
        committed: true,
        started_at,
        elapsed_ms: clock.elapsed().as_millis() as u64,
    })
}

/// Commands a run would execute, in catalog order, without touching disk
pub fn dry_run(
    config: &RunConfig,
    factory: &dyn CommandFactory,
    optimizer_available: bool,
) -> Vec<(JobKind, String)> {
    JobGraph::build(config, optimizer_available)
        .jobs()
        .iter()
        .map(|job| (job.kind, format_cmd(&factory.command(job.kind, config))))
        .collect()
}
