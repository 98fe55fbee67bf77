//! Classifier: labels derived from existing columns.

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Value};

/// An order is VIP when its `total_amount` is strictly greater than this.
pub const VIP_THRESHOLD: f64 = 1000.0;

/// Trim and uppercase `country`. Nulls pass through unchanged.
pub fn normalize_country(dataset: DataSet) -> EtlResult<DataSet> {
    dataset.map_column("country", DataType::Utf8, |v| match v {
        Value::Utf8(s) => Value::Utf8(s.trim().to_uppercase()),
        Value::Null => Value::Null,
        other => Value::Utf8(other.to_string().trim().to_uppercase()),
    })
}

/// Add boolean `vip = total_amount > VIP_THRESHOLD`.
///
/// A null or non-numeric `total_amount` classifies as `false`.
pub fn categorize_vip(dataset: DataSet) -> EtlResult<DataSet> {
    let idx = dataset.require_column("total_amount")?;
    let flags = dataset
        .rows
        .iter()
        .map(|row| Value::Bool(row[idx].as_f64().is_some_and(|t| t > VIP_THRESHOLD)))
        .collect();
    Ok(dataset.with_column(Field::new("vip", DataType::Bool), flags))
}
