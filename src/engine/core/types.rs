use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::variants::Variant;

/// Heights produced by the poster resize/optimize stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PosterSize {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl PosterSize {
    pub const ALL: [PosterSize; 4] = [
        PosterSize::P1080,
        PosterSize::P720,
        PosterSize::P480,
        PosterSize::P360,
    ];

    pub fn height(self) -> u32 {
        match self {
            PosterSize::P1080 => 1080,
            PosterSize::P720 => 720,
            PosterSize::P480 => 480,
            PosterSize::P360 => 360,
        }
    }
}

impl fmt::Display for PosterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

/// Which timeout budget a job is held to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    Encode,
    Stream,
    Poster,
    Optimize,
}

/// Every unit of work a run can schedule.
///
/// Identity is the enum value itself; file names and argument templates hang
/// off it so nothing downstream dispatches on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Webm,
    H265,
    H264,
    H264p720,
    H264p480,
    H264p360,
    Hls,
    Dash,
    PosterExtract,
    PosterResize(PosterSize),
    PosterOptimize(PosterSize),
}

impl JobKind {
    /// Full catalog in scheduling order
    pub fn catalog() -> Vec<JobKind> {
        let mut kinds = vec![
            JobKind::Webm,
            JobKind::H265,
            JobKind::H264,
            JobKind::H264p720,
            JobKind::H264p480,
            JobKind::H264p360,
            JobKind::Hls,
            JobKind::Dash,
            JobKind::PosterExtract,
        ];
        kinds.extend(PosterSize::ALL.map(JobKind::PosterResize));
        kinds.extend(PosterSize::ALL.map(JobKind::PosterOptimize));
        kinds
    }

    /// The user-facing variant that turns this job on or off
    pub fn variant(self) -> Variant {
        match self {
            JobKind::Webm => Variant::Webm,
            JobKind::H265 => Variant::H265,
            JobKind::H264 => Variant::H264,
            JobKind::H264p720 => Variant::P720,
            JobKind::H264p480 => Variant::P480,
            JobKind::H264p360 => Variant::P360,
            JobKind::Hls => Variant::Hls,
            JobKind::Dash => Variant::Dash,
            JobKind::PosterExtract | JobKind::PosterResize(_) | JobKind::PosterOptimize(_) => {
                Variant::Posters
            }
        }
    }

    /// Job that must have succeeded before this one may start
    pub fn depends_on(self) -> Option<JobKind> {
        match self {
            JobKind::PosterResize(_) => Some(JobKind::PosterExtract),
            JobKind::PosterOptimize(size) => Some(JobKind::PosterResize(size)),
            _ => None,
        }
    }

    pub fn timeout_class(self) -> TimeoutClass {
        match self {
            JobKind::Hls | JobKind::Dash => TimeoutClass::Stream,
            JobKind::PosterExtract | JobKind::PosterResize(_) => TimeoutClass::Poster,
            JobKind::PosterOptimize(_) => TimeoutClass::Optimize,
            _ => TimeoutClass::Encode,
        }
    }

    /// Artifact path relative to the run's output directory.
    ///
    /// Optimize jobs rewrite their parent's file in place, so they report the
    /// same path as the matching resize.
    pub fn output_path(self, name: &str) -> PathBuf {
        match self {
            JobKind::Webm => PathBuf::from(format!("{name}.webm")),
            JobKind::H265 => PathBuf::from(format!("{name}.mp4")),
            JobKind::H264 => PathBuf::from(format!("{name}_h264.mp4")),
            JobKind::H264p720 => PathBuf::from(format!("{name}_720p.mp4")),
            JobKind::H264p480 => PathBuf::from(format!("{name}_480p.mp4")),
            JobKind::H264p360 => PathBuf::from(format!("{name}_360p.mp4")),
            JobKind::Hls => PathBuf::from("hls").join("master.m3u8"),
            JobKind::Dash => PathBuf::from("dash").join("manifest.mpd"),
            JobKind::PosterExtract => PathBuf::from(format!("{name}-poster.jpg")),
            JobKind::PosterResize(size) | JobKind::PosterOptimize(size) => {
                PathBuf::from(format!("{name}-poster-{size}.jpg"))
            }
        }
    }

    /// Scratch file the optimizer writes before the size comparison
    pub fn candidate_path(self, name: &str) -> Option<PathBuf> {
        match self {
            JobKind::PosterOptimize(size) => {
                Some(PathBuf::from(format!("{name}-poster-{size}.optimized.jpg")))
            }
            _ => None,
        }
    }

    /// Subdirectory the job owns and writes into, created before launch
    pub fn workdir(self) -> Option<&'static str> {
        match self {
            JobKind::Hls => Some("hls"),
            JobKind::Dash => Some("dash"),
            _ => None,
        }
    }

    /// Kinds whose artifacts are listed for a variant in the report
    pub fn artifacts_for(variant: Variant) -> Vec<JobKind> {
        Self::catalog()
            .into_iter()
            .filter(|k| k.variant() == variant && !matches!(k, JobKind::PosterOptimize(_)))
            .collect()
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Webm => f.write_str("webm"),
            JobKind::H265 => f.write_str("h265"),
            JobKind::H264 => f.write_str("h264"),
            JobKind::H264p720 => f.write_str("h264-720p"),
            JobKind::H264p480 => f.write_str("h264-480p"),
            JobKind::H264p360 => f.write_str("h264-360p"),
            JobKind::Hls => f.write_str("hls"),
            JobKind::Dash => f.write_str("dash"),
            JobKind::PosterExtract => f.write_str("poster-extract"),
            JobKind::PosterResize(size) => write!(f, "poster-resize-{size}"),
            JobKind::PosterOptimize(size) => write!(f, "poster-optimize-{size}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped, // Never launched because the run was aborted
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Skipped
        )
    }

    /// Lifecycle edges; terminal states are never left
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Skipped)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub kind: JobKind,
    pub status: JobStatus,

    // Filled in by the executor
    pub elapsed_ms: Option<u64>,
    pub note: Option<String>,
}

impl Job {
    /// Create a new pending job
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            status: JobStatus::Pending,
            elapsed_ms: None,
            note: None,
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed_ms.map(Duration::from_millis)
    }
}
