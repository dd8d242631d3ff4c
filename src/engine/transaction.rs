//! All-or-nothing ownership of a run's output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Guard over the output directory.
///
/// The directory is created by [`OutputTransaction::begin`] and removed again
/// unless [`OutputTransaction::commit`] is called. Dropping the guard on an
/// early return or while unwinding from a panic takes the removal path too.
#[derive(Debug)]
pub struct OutputTransaction {
    dir: PathBuf,
    finished: bool,
}

impl OutputTransaction {
    /// Claim `dir` for this run. An existing directory is never reused or
    /// touched; the caller has to clear it.
    pub fn begin(dir: &Path) -> Result<Self> {
        match fs::create_dir(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::OutputExists(dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }
        tracing::debug!("created output directory {}", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Keep the directory and everything in it
    pub fn commit(mut self) -> PathBuf {
        self.finished = true;
        tracing::debug!("committed {}", self.dir.display());
        std::mem::take(&mut self.dir)
    }

    /// Remove the directory and everything in it
    pub fn rollback(mut self) -> io::Result<()> {
        self.finished = true;
        remove_tree(&self.dir)
    }
}

impl Drop for OutputTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match remove_tree(&self.dir) {
            Ok(()) => tracing::warn!("removed unfinished output {}", self.dir.display()),
            Err(e) => tracing::error!("Failed to remove {}: {}", self.dir.display(), e),
        }
    }
}

fn remove_tree(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
