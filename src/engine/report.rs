//! Final run manifest: which artifacts exist where.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::core::{Job, JobKind, RunConfig};
use super::variants::{EnabledVariants, Variant};

/// Marker printed for variants the run was told not to produce
pub const NOT_GENERATED: &str = "(not generated)";

/// One report row
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub variant: String,
    pub generated: bool,
    /// Primary file(s) for the variant; empty when not generated
    pub paths: Vec<PathBuf>,
    /// On-disk size including streaming segments
    pub bytes: u64,
}

/// Everything known about a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub has_audio: bool,
    pub enabled: EnabledVariants,
    pub jobs: Vec<Job>,
    pub artifacts: Vec<Artifact>,
    pub committed: bool,
    pub started_at: DateTime<Local>,
    pub elapsed_ms: u64,
}

/// Size of a file, or of everything under a directory
fn disk_usage(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// Gather artifact rows for every variant from the committed output
pub fn collect_artifacts(run: &RunConfig) -> Vec<Artifact> {
    Variant::ALL
        .into_iter()
        .map(|variant| {
            if !run.enabled().is_enabled(variant) {
                return Artifact {
                    variant: variant.name().to_string(),
                    generated: false,
                    paths: Vec::new(),
                    bytes: 0,
                };
            }

            let paths: Vec<PathBuf> = JobKind::artifacts_for(variant)
                .into_iter()
                .map(|kind| run.artifact_path(kind))
                .collect();
            let bytes = JobKind::artifacts_for(variant)
                .into_iter()
                .map(|kind| match kind.workdir() {
                    Some(dir) => disk_usage(&run.output_dir().join(dir)),
                    None => disk_usage(&run.artifact_path(kind)),
                })
                .sum();

            Artifact {
                variant: variant.name().to_string(),
                generated: true,
                paths,
                bytes,
            }
        })
        .collect()
}

/// Human readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Render the text report
pub fn render(result: &RunResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Input:   {}", result.input_path.display());
    let _ = writeln!(out, "Output:  {}", result.output_dir.display());
    let _ = writeln!(
        out,
        "Audio:   {}",
        if result.has_audio { "yes" } else { "no" }
    );
    let _ = writeln!(
        out,
        "Started: {} ({:.1}s)",
        result.started_at.format("%Y-%m-%d %H:%M:%S"),
        result.elapsed_ms as f64 / 1000.0
    );
    out.push('\n');

    let width = Variant::ALL
        .iter()
        .map(|v| v.name().len())
        .max()
        .unwrap_or(0);

    for artifact in &result.artifacts {
        if !artifact.generated || artifact.paths.is_empty() {
            let _ = writeln!(out, "  {:<width$}  {}", artifact.variant, NOT_GENERATED);
            continue;
        }
        for (i, path) in artifact.paths.iter().enumerate() {
            let label = if i == 0 { artifact.variant.as_str() } else { "" };
            if i == 0 {
                let _ = writeln!(
                    out,
                    "  {:<width$}  {} ({})",
                    label,
                    path.display(),
                    format_bytes(artifact.bytes)
                );
            } else {
                let _ = writeln!(out, "  {:<width$}  {}", label, path.display());
            }
        }
    }

    let notes: Vec<&Job> = result.jobs.iter().filter(|j| j.note.is_some()).collect();
    if !notes.is_empty() {
        out.push('\n');
        for job in notes {
            let _ = writeln!(
                out,
                "  note: {}: {}",
                job.kind,
                job.note.as_deref().unwrap_or_default()
            );
        }
    }

    out
}

/// Render the report as pretty JSON
pub fn render_json(result: &RunResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
