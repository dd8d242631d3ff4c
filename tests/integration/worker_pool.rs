// Concurrency limits of the executor

use crate::common::helpers::{Fixture, Script, fast_settings};
use std::time::Duration;
use webvariants::engine::graph::JobGraph;
use webvariants::engine::worker::Executor;
use webvariants::engine::{CancelToken, EnabledVariants, JobKind, JobStatus, Variant};

fn encodes_only() -> EnabledVariants {
    let mut enabled = EnabledVariants::none();
    for variant in [Variant::Webm, Variant::H265, Variant::H264] {
        enabled.set(variant, true);
    }
    enabled
}

/// Highest number of jobs between their start and end markers at once
fn max_overlap(events: &[String]) -> usize {
    let mut running = 0usize;
    let mut peak = 0usize;
    for event in events {
        if event.starts_with("start ") {
            running += 1;
            peak = peak.max(running);
        } else if event.starts_with("end ") {
            running = running.saturating_sub(1);
        }
    }
    peak
}

#[test]
fn test_single_slot_serializes_jobs() {
    let fx = Fixture::new();
    let run = fx.run_config(encodes_only(), true);
    std::fs::create_dir(run.output_dir()).unwrap();

    let commands = fx
        .commands()
        .with_default(Script::Slow(Duration::from_millis(50), 10));
    let mut settings = fast_settings(None);
    settings.max_parallel = 1;

    let mut graph = JobGraph::build(&run, true);
    Executor::new(&commands, &settings, CancelToken::new())
        .execute(&run, &mut graph)
        .unwrap();

    assert!(graph.all_succeeded());
    assert_eq!(max_overlap(&fx.events()), 1);
}

#[test]
fn test_unbounded_runs_independent_jobs_together() {
    let fx = Fixture::new();
    let run = fx.run_config(encodes_only(), true);
    std::fs::create_dir(run.output_dir()).unwrap();

    let commands = fx
        .commands()
        .with_default(Script::Slow(Duration::from_millis(300), 10));
    let settings = fast_settings(None);

    let mut graph = JobGraph::build(&run, true);
    Executor::new(&commands, &settings, CancelToken::new())
        .execute(&run, &mut graph)
        .unwrap();

    assert_eq!(max_overlap(&fx.events()), 3);
}

#[test]
fn test_pending_jobs_are_skipped_after_failure() {
    let fx = Fixture::new();
    let mut enabled = EnabledVariants::none();
    enabled.set(Variant::Webm, true);
    enabled.set(Variant::Posters, true);
    let run = fx.run_config(enabled, false);
    std::fs::create_dir(run.output_dir()).unwrap();

    let commands = fx.commands().with(JobKind::Webm, Script::Fail).with(
        JobKind::PosterExtract,
        Script::Slow(Duration::from_millis(200), 10),
    );
    let settings = fast_settings(None);

    let mut graph = JobGraph::build(&run, true);
    let result = Executor::new(&commands, &settings, CancelToken::new()).execute(&run, &mut graph);

    assert!(result.is_err());
    assert_eq!(graph.status(JobKind::Webm), Some(JobStatus::Failed));
    assert_eq!(
        graph.status(JobKind::PosterResize(webvariants::engine::PosterSize::P720)),
        Some(JobStatus::Skipped)
    );
    assert!(graph.is_finished());
}
