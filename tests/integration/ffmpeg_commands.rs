// Command templates as the production factory renders them

use crate::common::assertions::*;
use crate::common::helpers::cmd_to_string;
use std::path::PathBuf;
use webvariants::config::ToolsConfig;
use webvariants::engine::{
    CommandFactory, EnabledVariants, FfmpegCommands, JobKind, PosterSize, RunConfig,
};

fn render(kind: JobKind, has_audio: bool) -> String {
    let run = RunConfig::new(
        PathBuf::from("/videos/trip.mov"),
        EnabledVariants::all(),
        has_audio,
    )
    .unwrap();
    cmd_to_string(&FfmpegCommands::default().command(kind, &run))
}

#[test]
fn test_every_ffmpeg_job_shares_the_prefix() {
    for kind in JobKind::catalog() {
        if matches!(kind, JobKind::PosterOptimize(_)) {
            continue;
        }
        let cmd = render(kind, true);
        assert!(
            cmd.starts_with("ffmpeg -hide_banner -loglevel error -y -i "),
            "{kind}: {cmd}"
        );
    }
}

#[test]
fn test_audio_clause_follows_probe() {
    for kind in [
        JobKind::Webm,
        JobKind::H265,
        JobKind::H264,
        JobKind::H264p360,
        JobKind::Dash,
    ] {
        let with_audio = render(kind, true);
        assert_cmd_contains(&with_audio, "-map 0:a:0");
        assert_cmd_not_contains(&with_audio, " -an ");

        let silent = render(kind, false);
        assert_cmd_contains(&silent, " -an ");
        assert_cmd_not_contains(&silent, "0:a:0");
    }
}

#[test]
fn test_encoder_choices() {
    assert_cmd_has_flag_value(&render(JobKind::Webm, true), "-c:v", "libvpx-vp9");
    assert_cmd_has_flag_value(&render(JobKind::Webm, true), "-c:a", "libopus");
    assert_cmd_has_flag_value(&render(JobKind::H265, true), "-c:v", "libx265");
    assert_cmd_has_flag_value(&render(JobKind::H265, true), "-tag:v", "hvc1");
    assert_cmd_has_flag_value(&render(JobKind::H264, true), "-c:v", "libx264");
    assert_eq!(get_flag_value(&render(JobKind::H264, true), "-crf"), Some("23"));
}

#[test]
fn test_scaled_h264_heights() {
    assert_cmd_not_contains(&render(JobKind::H264, false), "scale=");
    assert_cmd_has_flag_value(&render(JobKind::H264p720, false), "-vf", "scale=-2:720");
    assert_cmd_has_flag_value(&render(JobKind::H264p480, false), "-vf", "scale=-2:480");
    assert_cmd_has_flag_value(&render(JobKind::H264p360, false), "-vf", "scale=-2:360");
}

#[test]
fn test_outputs_land_in_sibling_directory() {
    assert!(render(JobKind::Webm, true).ends_with(" /videos/trip/trip.webm"));
    assert!(render(JobKind::H265, true).ends_with(" /videos/trip/trip.mp4"));
    assert!(render(JobKind::H264p480, true).ends_with(" /videos/trip/trip_480p.mp4"));
    assert!(render(JobKind::Dash, true).ends_with(" /videos/trip/dash/manifest.mpd"));
    assert!(render(JobKind::PosterExtract, true).ends_with(" /videos/trip/trip-poster.jpg"));
}

#[test]
fn test_hls_ladder_maps_audio_per_rendition() {
    let with_audio = render(JobKind::Hls, true);
    assert_cmd_contains(&with_audio, "-var_stream_map v:0,a:0 v:1,a:1 v:2,a:2 v:3,a:3 ");
    assert_cmd_has_flag_value(&with_audio, "-master_pl_name", "master.m3u8");
    assert_cmd_contains(&with_audio, "/videos/trip/hls/%v/playlist.m3u8");

    let silent = render(JobKind::Hls, false);
    assert_cmd_contains(&silent, "-var_stream_map v:0 v:1 v:2 v:3 ");
    assert_cmd_not_contains(&silent, "a:0");
}

#[test]
fn test_poster_chain_reads_the_extracted_frame() {
    let resize = render(JobKind::PosterResize(PosterSize::P720), true);
    assert_cmd_has_flag_value(&resize, "-i", "/videos/trip/trip-poster.jpg");
    assert!(resize.ends_with(" /videos/trip/trip-poster-720p.jpg"));

    let optimize = render(JobKind::PosterOptimize(PosterSize::P360), true);
    assert_eq!(
        optimize,
        "guetzli /videos/trip/trip-poster-360p.jpg /videos/trip/trip-poster-360p.optimized.jpg"
    );
}

#[test]
fn test_configured_tool_names_are_used() {
    let tools = ToolsConfig {
        ffmpeg: "/opt/ffmpeg/bin/ffmpeg".to_string(),
        optimizer: "jpeg-shrink".to_string(),
        ..ToolsConfig::default()
    };
    let factory = FfmpegCommands::new(tools);
    let run = RunConfig::new(PathBuf::from("/v/a.mp4"), EnabledVariants::all(), false).unwrap();

    let webm = factory.command(JobKind::Webm, &run);
    assert_eq!(webm.get_program(), "/opt/ffmpeg/bin/ffmpeg");
    let optimize = factory.command(JobKind::PosterOptimize(PosterSize::P480), &run);
    assert_eq!(optimize.get_program(), "jpeg-shrink");
}
