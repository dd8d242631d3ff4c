//! Optimistic replacement of poster files by an optimizer's output.

use std::fs;
use std::io;
use std::path::Path;

/// What happened to a poster after optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Candidate was strictly smaller and now sits at the original path
    Replaced { before: u64, after: u64 },
    /// Candidate was not smaller; original kept, candidate removed
    KeptOriginal { before: u64, candidate: u64 },
}

/// Keep `candidate` only if it is strictly smaller than `original`.
///
/// Either way the candidate path no longer exists afterwards, and the file at
/// `original` never grows.
pub fn keep_smaller(original: &Path, candidate: &Path) -> io::Result<Replacement> {
    let before = fs::metadata(original)?.len();
    let after = match fs::metadata(candidate) {
        Ok(meta) => meta.len(),
        Err(e) => {
            discard(candidate);
            return Err(e);
        }
    };

    if after > 0 && after < before {
        fs::rename(candidate, original)?;
        Ok(Replacement::Replaced { before, after })
    } else {
        discard(candidate);
        Ok(Replacement::KeptOriginal {
            before,
            candidate: after,
        })
    }
}

/// Best-effort removal of a leftover candidate
pub fn discard(candidate: &Path) {
    match fs::remove_file(candidate) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", candidate.display(), e),
    }
}
