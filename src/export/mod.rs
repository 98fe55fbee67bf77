//! Exporters: serialize the final record set.
//!
//! Most callers should use [`export_all`], which writes every [`ExportTarget`] or none of them:
//!
//! - each target is first written to a [`staging::StagedFile`] next to its destination
//! - targets are written in parallel (they share no data beyond the read-only record set)
//! - staged files are renamed into place only after every target succeeded
//!
//! Format-specific writers live under [`csv`] and [`parquet`].

pub mod csv;
pub mod parquet;
pub mod staging;
pub mod unified;

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::EtlResult;
use crate::types::DataSet;

pub use staging::StagedFile;
pub use unified::{ExportFormat, ExportTarget, ParquetCompression, export_to_path};

/// Write `dataset` to every target, all-or-nothing.
///
/// Returns the published paths in target order. On error, no target path is left created by
/// this call.
pub fn export_all(dataset: &DataSet, targets: &[ExportTarget]) -> EtlResult<Vec<PathBuf>> {
    let staged: Vec<StagedFile> = targets
        .par_iter()
        .map(|target| -> EtlResult<StagedFile> {
            let staged = StagedFile::new(&target.path);
            export_to_path(dataset, staged.path(), target)?;
            debug!(
                format = %target.format,
                compression = ?target.compression,
                path = %target.path.display(),
                "staged export"
            );
            Ok(staged)
        })
        .collect::<EtlResult<Vec<_>>>()?;

    let mut published: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for file in staged {
        match file.commit() {
            Ok(path) => published.push(path),
            Err(e) => {
                // Roll back what was already published; still-staged files are removed on drop.
                for path in &published {
                    if let Err(rm) = fs::remove_file(path) {
                        warn!(path = %path.display(), error = %rm, "failed to roll back export");
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(published)
}
