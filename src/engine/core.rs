mod ffmpeg_cmd;
mod ffmpeg_info;
mod run_config;
mod types;

pub use ffmpeg_cmd::{CommandFactory, FfmpegCommands, build_job_cmd, cmd_args, format_cmd};
pub use ffmpeg_info::{ffmpeg_version, ffprobe_version, tool_available};
pub use run_config::{RunConfig, resolve_input};
pub use types::{Job, JobKind, JobStatus, PosterSize, TimeoutClass};
