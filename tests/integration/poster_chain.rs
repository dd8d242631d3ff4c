// extract -> resize -> optimize ordering and the keep-smaller policy

use crate::common::helpers::{DEFAULT_BYTES, Fixture, Script, fast_settings, file_len};
use std::time::Duration;
use webvariants::Error;
use webvariants::engine::{
    CancelToken, EnabledVariants, JobKind, JobStatus, PosterSize, Variant, pipeline,
};

fn posters_only() -> EnabledVariants {
    let mut enabled = EnabledVariants::none();
    enabled.set(Variant::Posters, true);
    enabled
}

#[test]
fn test_resizes_wait_for_extract() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);
    let commands = fx.commands().with(
        JobKind::PosterExtract,
        Script::Slow(Duration::from_millis(150), DEFAULT_BYTES),
    );

    pipeline::run(&run, &fast_settings(None), &commands, true, CancelToken::new()).unwrap();

    let extract_end = fx.position("end poster-extract").unwrap();
    for size in PosterSize::ALL {
        let resize = JobKind::PosterResize(size);
        let optimize = JobKind::PosterOptimize(size);
        let resize_start = fx.position(&format!("start {resize}")).unwrap();
        let resize_end = fx.position(&format!("end {resize}")).unwrap();
        let optimize_start = fx.position(&format!("start {optimize}")).unwrap();
        assert!(extract_end < resize_start, "{resize} started before extract ended");
        assert!(resize_end < optimize_start, "{optimize} started before {resize} ended");
    }
}

#[test]
fn test_failed_extract_blocks_every_resize() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);
    let commands = fx.commands().with(JobKind::PosterExtract, Script::Fail);

    let err = pipeline::run(&run, &fast_settings(None), &commands, true, CancelToken::new())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::JobFailed {
            job: JobKind::PosterExtract,
            ..
        }
    ));
    assert!(
        fx.events()
            .iter()
            .all(|e| !e.starts_with("start poster-resize")),
        "{:?}",
        fx.events()
    );
    assert!(!fx.output_dir().exists());
}

#[test]
fn test_smaller_candidate_replaces_poster() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);
    let commands = fx
        .commands()
        .with(JobKind::PosterOptimize(PosterSize::P720), Script::Write(300));

    let result =
        pipeline::run(&run, &fast_settings(None), &commands, true, CancelToken::new()).unwrap();

    let out = fx.output_dir();
    assert_eq!(file_len(&out.join("clip-poster-720p.jpg")), 300);
    assert!(!out.join("clip-poster-720p.optimized.jpg").exists());
    let job = result
        .jobs
        .iter()
        .find(|j| j.kind == JobKind::PosterOptimize(PosterSize::P720))
        .unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
}

#[test]
fn test_larger_candidate_is_discarded() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);
    let commands = fx
        .commands()
        .with(JobKind::PosterOptimize(PosterSize::P480), Script::Write(5000));

    pipeline::run(&run, &fast_settings(None), &commands, true, CancelToken::new()).unwrap();

    let out = fx.output_dir();
    assert_eq!(
        file_len(&out.join("clip-poster-480p.jpg")),
        DEFAULT_BYTES as u64
    );
    assert!(!out.join("clip-poster-480p.optimized.jpg").exists());
}

#[test]
fn test_optimizer_failure_keeps_original_and_commits() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);
    let commands = fx
        .commands()
        .with(JobKind::PosterOptimize(PosterSize::P1080), Script::Fail);

    let result =
        pipeline::run(&run, &fast_settings(None), &commands, true, CancelToken::new()).unwrap();

    let out = fx.output_dir();
    assert!(result.committed);
    assert_eq!(
        file_len(&out.join("clip-poster-1080p.jpg")),
        DEFAULT_BYTES as u64
    );
    assert!(!out.join("clip-poster-1080p.optimized.jpg").exists());
    let job = result
        .jobs
        .iter()
        .find(|j| j.kind == JobKind::PosterOptimize(PosterSize::P1080))
        .unwrap();
    assert!(job.note.as_deref().unwrap_or_default().contains("kept original"));
}

#[test]
fn test_optimizer_timeout_keeps_original() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);
    let commands = fx
        .commands()
        .with(JobKind::PosterOptimize(PosterSize::P360), Script::Hang);

    let result = pipeline::run(
        &run,
        &fast_settings(Some(Duration::from_millis(300))),
        &commands,
        true,
        CancelToken::new(),
    )
    .unwrap();

    assert!(result.committed);
    assert_eq!(
        file_len(&fx.output_dir().join("clip-poster-360p.jpg")),
        DEFAULT_BYTES as u64
    );
}

#[test]
fn test_unavailable_optimizer_skips_optimize_jobs() {
    let fx = Fixture::new();
    let run = fx.run_config(posters_only(), false);

    let result = pipeline::run(
        &run,
        &fast_settings(None),
        &fx.commands(),
        false,
        CancelToken::new(),
    )
    .unwrap();

    assert_eq!(result.jobs.len(), 5);
    assert!(fx.events().iter().all(|e| !e.contains("poster-optimize")));
    for size in PosterSize::ALL {
        assert_eq!(
            file_len(&fx.output_dir().join(format!("clip-poster-{size}.jpg"))),
            DEFAULT_BYTES as u64
        );
    }
}
