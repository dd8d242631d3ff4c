use anyhow::{Context, Result};
use std::process::Command;

/// Check if ffmpeg is available and return its version line
pub fn ffmpeg_version(program: &str) -> Result<String> {
    tool_version(program)
}

/// Check if ffprobe is available and return its version line
pub fn ffprobe_version(program: &str) -> Result<String> {
    tool_version(program)
}

fn tool_version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .with_context(|| format!("Failed to execute {program}. Is it installed and in PATH?"))?;

    if !output.status.success() {
        anyhow::bail!("{} -version failed with status: {}", program, output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Whether an optional tool (the poster optimizer) can be found
pub fn tool_available(program: &str) -> bool {
    which::which(program).is_ok()
}
