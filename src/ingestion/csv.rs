//! CSV ingestion implementation.

use std::path::Path;

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Cell contents read as [`Value::Null`] (the usual spreadsheet/pandas missing-value markers).
pub const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "<NA>", "NaN", "nan", "-NaN", "NULL", "null", "None", "#N/A",
];

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers; header names are kept verbatim (see
///   [`crate::transform::standardize_column_names`]).
/// - Every column is read as [`DataType::Utf8`]. Typing known columns is the Normalizer's job.
/// - Cells matching [`NULL_TOKENS`] become [`Value::Null`]; other cells are kept untrimmed.
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> EtlResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> EtlResult<DataSet> {
    let headers = rdr.headers()?.clone();
    let schema = Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8))
            .collect(),
    );

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = (0..schema.fields.len())
            .map(|idx| raw_value(record.get(idx).unwrap_or("")))
            .collect();
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn raw_value(raw: &str) -> Value {
    if NULL_TOKENS.contains(&raw) {
        Value::Null
    } else {
        Value::Utf8(raw.to_owned())
    }
}
