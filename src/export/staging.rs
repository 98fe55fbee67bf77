//! Staged output files.
//!
//! A [`StagedFile`] reserves a hidden sibling of its destination. Writers fill the staged path;
//! [`StagedFile::commit`] renames it into place. A staged file that is dropped without being
//! committed is removed, so every early return leaves no partial output behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::EtlResult;

/// A not-yet-published output file.
#[derive(Debug)]
pub struct StagedFile {
    staged: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Reserve a staging path next to `target` (same directory, so the final rename is atomic).
    pub fn new(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staged = target.with_file_name(format!(".{name}.{}.tmp", std::process::id()));
        Self {
            staged,
            target: target.to_path_buf(),
            committed: false,
        }
    }

    /// Path writers should write to.
    pub fn path(&self) -> &Path {
        &self.staged
    }

    /// Move the staged file to its destination, replacing any existing file.
    pub fn commit(mut self) -> EtlResult<PathBuf> {
        fs::rename(&self.staged, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_file(&self.staged) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.staged.display(),
                error = %e,
                "failed to remove staged output"
            ),
        }
    }
}
