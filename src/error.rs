use std::path::PathBuf;
use thiserror::Error;

use crate::engine::JobKind;

/// Errors surfaced by a run
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    #[error("input file not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("input path has no usable file name: {}", .0.display())]
    InvalidInput(PathBuf),

    #[error(
        "input has no extension, so its output directory would be the input itself: {}",
        .0.display()
    )]
    OutputIsInput(PathBuf),

    #[error("output directory already exists: {} (remove it first)", .0.display())]
    OutputExists(PathBuf),

    #[error("job {job} failed: {reason}")]
    JobFailed { job: JobKind, reason: String },

    #[error("job {0} never ran because a dependency did not succeed")]
    Unschedulable(JobKind),

    #[error("run cancelled")]
    Cancelled,

    #[error("{cause}; could not remove output directory {}: {source}", .dir.display())]
    RollbackFailed {
        cause: Box<Error>,
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when a run created its output directory and removed it again.
    ///
    /// Errors raised before the directory was claimed, and rollbacks that
    /// left something behind, are false.
    pub fn output_removed(&self) -> bool {
        matches!(
            self,
            Error::JobFailed { .. } | Error::Unschedulable(_) | Error::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
