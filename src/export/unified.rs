//! Export formats, output targets and the single-target entrypoint.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::error::{EtlError, EtlResult};
use crate::types::DataSet;

use super::{csv, parquet};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// Apache Parquet.
    Parquet,
}

impl ExportFormat {
    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Only the exact lowercase names `csv` and `parquet` are accepted.
impl FromStr for ExportFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            _ => Err(EtlError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column compression used for Parquet output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    /// No compression.
    #[default]
    Uncompressed,
    /// Snappy compression.
    Snappy,
}

impl From<ParquetCompression> for ::parquet::basic::Compression {
    fn from(c: ParquetCompression) -> Self {
        match c {
            ParquetCompression::Uncompressed => ::parquet::basic::Compression::UNCOMPRESSED,
            ParquetCompression::Snappy => ::parquet::basic::Compression::SNAPPY,
        }
    }
}

/// One output file: where to write and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTarget {
    /// Destination path.
    pub path: PathBuf,
    /// Serialization format.
    pub format: ExportFormat,
    /// Parquet compression (ignored for CSV).
    pub compression: ParquetCompression,
}

impl ExportTarget {
    /// Create a target with no compression.
    pub fn new(path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            path: path.into(),
            format,
            compression: ParquetCompression::Uncompressed,
        }
    }

    /// Set Parquet compression.
    pub fn with_compression(mut self, compression: ParquetCompression) -> Self {
        self.compression = compression;
        self
    }

    /// The three fixed outputs derived from an extension-agnostic base path:
    ///
    /// - `<base>.csv`
    /// - `<base>.parquet` (uncompressed)
    /// - `<base>.snappy.parquet` (Snappy)
    ///
    /// Any extension already on `base` is replaced.
    pub fn standard_set(base: &Path) -> EtlResult<Vec<ExportTarget>> {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("output path has no file name: {}", base.display()),
                )
            })?;

        Ok(vec![
            ExportTarget::new(base.with_extension("csv"), ExportFormat::Csv),
            ExportTarget::new(base.with_extension("parquet"), ExportFormat::Parquet),
            ExportTarget::new(
                base.with_file_name(format!("{stem}.snappy.parquet")),
                ExportFormat::Parquet,
            )
            .with_compression(ParquetCompression::Snappy),
        ])
    }
}

/// Write `dataset` to `path` in the target's format.
///
/// The path is taken separately from the target so callers can write to a staging location.
pub fn export_to_path(dataset: &DataSet, path: &Path, target: &ExportTarget) -> EtlResult<()> {
    match target.format {
        ExportFormat::Csv => csv::write_csv(dataset, path),
        ExportFormat::Parquet => parquet::write_parquet(dataset, path, target.compression),
    }
}
