// Audio presence probing using ffprobe

use std::path::Path;
use std::process::Command;

/// Ask ffprobe whether the input carries at least one audio stream.
///
/// Probing is advisory: any failure to run or parse counts as "no audio" so a
/// video-only render can still go ahead.
pub fn probe_has_audio(ffprobe: &str, input_path: &Path) -> bool {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(input_path)
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let has_audio = parse_has_audio(&String::from_utf8_lossy(&out.stdout));
            tracing::debug!(input = %input_path.display(), has_audio, "probed audio streams");
            has_audio
        }
        Ok(out) => {
            tracing::warn!(
                "ffprobe exited with {} for {}; assuming no audio: {}",
                out.status,
                input_path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            );
            false
        }
        Err(e) => {
            tracing::warn!("Failed to run {}: {}; assuming no audio", ffprobe, e);
            false
        }
    }
}

/// Interpret ffprobe's stream listing; one `audio` line is enough
pub fn parse_has_audio(listing: &str) -> bool {
    listing
        .lines()
        .map(|line| line.trim().trim_end_matches(','))
        .any(|line| line.eq_ignore_ascii_case("audio"))
}
