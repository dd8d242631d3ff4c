use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use super::run_config::RunConfig;
use super::types::{JobKind, PosterSize};
use crate::config::ToolsConfig;

/// Builds the external command for a job.
///
/// The executor only ever sees a [`Command`]; swapping the factory is how the
/// engine is driven without ffmpeg installed.
pub trait CommandFactory {
    fn command(&self, kind: JobKind, run: &RunConfig) -> Command;
}

/// Production templates: ffmpeg for every encode and poster step, the
/// configured optimizer for poster shrinking
#[derive(Debug, Clone)]
pub struct FfmpegCommands {
    tools: ToolsConfig,
}

impl FfmpegCommands {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }
}

impl Default for FfmpegCommands {
    fn default() -> Self {
        Self::new(ToolsConfig::default())
    }
}

impl CommandFactory for FfmpegCommands {
    fn command(&self, kind: JobKind, run: &RunConfig) -> Command {
        build_job_cmd(kind, run, &self.tools)
    }
}

/// One HLS ladder step: (height, video bitrate, maxrate, bufsize, audio bitrate)
struct Rendition {
    height: u32,
    video_kbps: u32,
    max_kbps: u32,
    buf_kbps: u32,
    audio_kbps: u32,
}

const HLS_LADDER: [Rendition; 4] = [
    Rendition {
        height: 1080,
        video_kbps: 5000,
        max_kbps: 5350,
        buf_kbps: 7500,
        audio_kbps: 192,
    },
    Rendition {
        height: 720,
        video_kbps: 2800,
        max_kbps: 2996,
        buf_kbps: 4200,
        audio_kbps: 128,
    },
    Rendition {
        height: 480,
        video_kbps: 1400,
        max_kbps: 1498,
        buf_kbps: 2100,
        audio_kbps: 128,
    },
    Rendition {
        height: 360,
        video_kbps: 800,
        max_kbps: 856,
        buf_kbps: 1200,
        audio_kbps: 96,
    },
];

/// Keyframe interval shared by the streaming packages so segments align
const GOP: &str = "48";

fn ffmpeg(tools: &ToolsConfig, input: &Path) -> Command {
    let mut cmd = Command::new(&tools.ffmpeg);
    cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"]);
    cmd.arg(input);
    cmd
}

fn apply_audio(cmd: &mut Command, run: &RunConfig, codec: &str, bitrate: &str) {
    if run.has_audio() {
        cmd.args(["-map", "0:a:0", "-c:a", codec, "-b:a", bitrate]);
    } else {
        cmd.arg("-an");
    }
}

fn apply_h264(cmd: &mut Command, crf: &str) {
    cmd.args([
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-crf",
        crf,
        "-profile:v",
        "high",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]);
}

fn build_webm_cmd(run: &RunConfig, tools: &ToolsConfig) -> Command {
    let mut cmd = ffmpeg(tools, run.input_path());
    cmd.args(["-map", "0:v:0"]);
    cmd.args([
        "-c:v",
        "libvpx-vp9",
        "-crf",
        "32",
        "-b:v",
        "0",
        "-row-mt",
        "1",
        "-deadline",
        "good",
        "-cpu-used",
        "2",
    ]);
    apply_audio(&mut cmd, run, "libopus", "128k");
    cmd.arg(run.artifact_path(JobKind::Webm));
    cmd
}

fn build_h265_cmd(run: &RunConfig, tools: &ToolsConfig) -> Command {
    let mut cmd = ffmpeg(tools, run.input_path());
    cmd.args(["-map", "0:v:0"]);
    cmd.args([
        "-c:v",
        "libx265",
        "-preset",
        "medium",
        "-crf",
        "28",
        "-tag:v",
        "hvc1",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]);
    apply_audio(&mut cmd, run, "aac", "128k");
    cmd.arg(run.artifact_path(JobKind::H265));
    cmd
}

fn build_h264_cmd(kind: JobKind, run: &RunConfig, tools: &ToolsConfig) -> Command {
    let height = match kind {
        JobKind::H264p720 => Some(720),
        JobKind::H264p480 => Some(480),
        JobKind::H264p360 => Some(360),
        _ => None,
    };

    let mut cmd = ffmpeg(tools, run.input_path());
    cmd.args(["-map", "0:v:0"]);
    if let Some(h) = height {
        cmd.arg("-vf").arg(format!("scale=-2:{h}"));
    }
    apply_h264(&mut cmd, "23");
    apply_audio(&mut cmd, run, "aac", "128k");
    cmd.arg(run.artifact_path(kind));
    cmd
}

fn build_hls_cmd(run: &RunConfig, tools: &ToolsConfig) -> Command {
    let hls_dir = run.output_dir().join("hls");
    let mut cmd = ffmpeg(tools, run.input_path());

    // One decoded video stream fanned out to every ladder step
    let labels: String = (0..HLS_LADDER.len()).map(|i| format!("[v{i}]")).collect();
    let scalers: Vec<String> = HLS_LADDER
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[v{i}]scale=-2:{}[v{i}out]", r.height))
        .collect();
    let graph = format!(
        "[0:v]split={}{};{}",
        HLS_LADDER.len(),
        labels,
        scalers.join(";")
    );
    cmd.arg("-filter_complex").arg(graph);

    for (i, r) in HLS_LADDER.iter().enumerate() {
        cmd.arg("-map").arg(format!("[v{i}out]"));
        cmd.arg(format!("-c:v:{i}")).arg("libx264");
        cmd.arg(format!("-b:v:{i}")).arg(format!("{}k", r.video_kbps));
        cmd.arg(format!("-maxrate:v:{i}"))
            .arg(format!("{}k", r.max_kbps));
        cmd.arg(format!("-bufsize:v:{i}"))
            .arg(format!("{}k", r.buf_kbps));
    }
    cmd.args([
        "-preset",
        "veryfast",
        "-g",
        GOP,
        "-keyint_min",
        GOP,
        "-sc_threshold",
        "0",
        "-pix_fmt",
        "yuv420p",
    ]);

    if run.has_audio() {
        for (i, r) in HLS_LADDER.iter().enumerate() {
            cmd.args(["-map", "0:a:0"]);
            cmd.arg(format!("-c:a:{i}")).arg("aac");
            cmd.arg(format!("-b:a:{i}")).arg(format!("{}k", r.audio_kbps));
        }
        cmd.args(["-ac", "2"]);
    } else {
        cmd.arg("-an");
    }

    let stream_map: Vec<String> = (0..HLS_LADDER.len())
        .map(|i| {
            if run.has_audio() {
                format!("v:{i},a:{i}")
            } else {
                format!("v:{i}")
            }
        })
        .collect();

    cmd.args([
        "-f",
        "hls",
        "-hls_time",
        "6",
        "-hls_playlist_type",
        "vod",
        "-hls_flags",
        "independent_segments",
        "-hls_segment_type",
        "mpegts",
    ]);
    cmd.arg("-hls_segment_filename")
        .arg(hls_dir.join("%v").join("segment%03d.ts"));
    cmd.args(["-master_pl_name", "master.m3u8"]);
    cmd.arg("-var_stream_map").arg(stream_map.join(" "));
    cmd.arg(hls_dir.join("%v").join("playlist.m3u8"));
    cmd
}

fn build_dash_cmd(run: &RunConfig, tools: &ToolsConfig) -> Command {
    let mut cmd = ffmpeg(tools, run.input_path());
    cmd.args(["-map", "0:v:0"]);
    cmd.args([
        "-c:v",
        "libx264",
        "-preset",
        "veryfast",
        "-crf",
        "23",
        "-g",
        GOP,
        "-keyint_min",
        GOP,
        "-sc_threshold",
        "0",
        "-pix_fmt",
        "yuv420p",
    ]);
    apply_audio(&mut cmd, run, "aac", "128k");
    cmd.args([
        "-f",
        "dash",
        "-seg_duration",
        "4",
        "-use_template",
        "1",
        "-use_timeline",
        "1",
        "-init_seg_name",
        "init-stream$RepresentationID$.m4s",
        "-media_seg_name",
        "chunk-stream$RepresentationID$-$Number%05d$.m4s",
    ]);
    cmd.arg(run.artifact_path(JobKind::Dash));
    cmd
}

fn build_poster_extract_cmd(run: &RunConfig, tools: &ToolsConfig) -> Command {
    let mut cmd = ffmpeg(tools, run.input_path());
    cmd.args([
        "-map",
        "0:v:0",
        "-vf",
        "thumbnail=300",
        "-frames:v",
        "1",
        "-q:v",
        "2",
        "-update",
        "1",
    ]);
    cmd.arg(run.artifact_path(JobKind::PosterExtract));
    cmd
}

fn build_poster_resize_cmd(size: PosterSize, run: &RunConfig, tools: &ToolsConfig) -> Command {
    let mut cmd = ffmpeg(tools, &run.artifact_path(JobKind::PosterExtract));
    cmd.arg("-vf").arg(format!("scale=-2:{}", size.height()));
    cmd.args(["-q:v", "2", "-update", "1"]);
    cmd.arg(run.artifact_path(JobKind::PosterResize(size)));
    cmd
}

fn build_poster_optimize_cmd(size: PosterSize, run: &RunConfig, tools: &ToolsConfig) -> Command {
    let kind = JobKind::PosterOptimize(size);
    let mut cmd = Command::new(&tools.optimizer);
    cmd.arg(run.artifact_path(kind));
    if let Some(candidate) = kind.candidate_path(run.name()) {
        cmd.arg(run.output_dir().join(candidate));
    }
    cmd
}

/// Build the command for one job from its template and the run config
pub fn build_job_cmd(kind: JobKind, run: &RunConfig, tools: &ToolsConfig) -> Command {
    match kind {
        JobKind::Webm => build_webm_cmd(run, tools),
        JobKind::H265 => build_h265_cmd(run, tools),
        JobKind::H264 | JobKind::H264p720 | JobKind::H264p480 | JobKind::H264p360 => {
            build_h264_cmd(kind, run, tools)
        }
        JobKind::Hls => build_hls_cmd(run, tools),
        JobKind::Dash => build_dash_cmd(run, tools),
        JobKind::PosterExtract => build_poster_extract_cmd(run, tools),
        JobKind::PosterResize(size) => build_poster_resize_cmd(size, run, tools),
        JobKind::PosterOptimize(size) => build_poster_optimize_cmd(size, run, tools),
    }
}

/// Render a command as a copy-pasteable shell line
pub fn format_cmd(cmd: &Command) -> String {
    let parts: Vec<String> = std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy().into_owned())
        .collect();
    shlex::try_join(parts.iter().map(String::as_str)).unwrap_or_else(|_| parts.join(" "))
}

/// Plain argument vector, mainly for assertions
pub fn cmd_args(cmd: &Command) -> Vec<OsString> {
    cmd.get_args().map(|a| a.to_os_string()).collect()
}
