use serde::Serialize;
use std::path::{Path, PathBuf};

use super::types::JobKind;
use crate::engine::variants::EnabledVariants;
use crate::error::{Error, Result};

/// Everything a run needs to know, fixed before the first job is built.
///
/// Constructed once per invocation and only ever handed out by reference.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    input_path: PathBuf,
    name: String,
    output_dir: PathBuf,
    enabled: EnabledVariants,
    has_audio: bool,
}

impl RunConfig {
    /// Build from an absolute input path. The output directory is a sibling
    /// of the input named after its extension-less file name.
    pub fn new(input_path: PathBuf, enabled: EnabledVariants, has_audio: bool) -> Result<Self> {
        if !input_path.is_absolute() {
            return Err(Error::InvalidInput(input_path));
        }

        let name = match input_path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => return Err(Error::InvalidInput(input_path)),
        };
        let output_dir = input_path
            .parent()
            .unwrap_or_else(|| Path::new("/"))
            .join(&name);
        if output_dir == input_path {
            return Err(Error::OutputIsInput(input_path));
        }

        Ok(Self {
            input_path,
            name,
            output_dir,
            enabled,
            has_audio,
        })
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn enabled(&self) -> &EnabledVariants {
        &self.enabled
    }

    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    /// Absolute artifact path for a job kind
    pub fn artifact_path(&self, kind: JobKind) -> PathBuf {
        self.output_dir.join(kind.output_path(&self.name))
    }
}

/// Check that the input exists and make it absolute
pub fn resolve_input(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(Error::InputMissing(path.to_path_buf()));
    }
    Ok(path.canonicalize()?)
}
