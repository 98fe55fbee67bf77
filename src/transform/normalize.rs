//! Normalizer: column-name standardization and type coercion for a single record set.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Value};

/// Order columns parsed as timestamps by [`convert_types`].
pub const TIMESTAMP_COLUMNS: &[&str] = &["order_date"];

/// Order columns parsed as numbers by [`convert_types`].
pub const NUMERIC_COLUMNS: &[&str] = &["quantity", "unit_price"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Trim, lowercase and replace every space with `_` in each column name.
///
/// Row values are untouched. Applying this twice gives the same schema as applying it once.
pub fn standardize_column_names(mut dataset: DataSet) -> DataSet {
    for field in &mut dataset.schema.fields {
        field.name = standardize_name(&field.name);
    }
    dataset
}

fn standardize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Parse `order_date` into [`DataType::Timestamp`] and `quantity`/`unit_price` into numbers.
///
/// Values that fail to parse become [`Value::Null`]; nothing is raised for malformed data.
/// A numeric column becomes [`DataType::Int64`] when every non-null value is an integer,
/// [`DataType::Float64`] otherwise.
///
/// Returns [`crate::EtlError::MissingColumn`] if one of the columns is absent.
pub fn convert_types(dataset: DataSet) -> EtlResult<DataSet> {
    let mut dataset = dataset;
    for &column in TIMESTAMP_COLUMNS {
        dataset = dataset.map_column(column, DataType::Timestamp, coerce_timestamp)?;
    }
    for &column in NUMERIC_COLUMNS {
        dataset = coerce_numeric_column(dataset, column)?;
    }
    Ok(dataset)
}

fn coerce_timestamp(value: &Value) -> Value {
    match value {
        Value::Timestamp(ts) => Value::Timestamp(*ts),
        Value::Utf8(s) => parse_timestamp(s).map_or(Value::Null, Value::Timestamp),
        _ => Value::Null,
    }
}

/// Parse a timestamp in one of the accepted shapes.
///
/// Zone-less inputs are local wall time. RFC 3339 inputs with an offset are converted to local
/// wall time so every value compares against the same clock.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn parse_number(value: &Value) -> Option<Number> {
    match value {
        Value::Int64(v) => Some(Number::Int(*v)),
        Value::Float64(v) if v.is_finite() => Some(Number::Float(*v)),
        Value::Utf8(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Some(Number::Int(v));
            }
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Number::Float)
        }
        _ => None,
    }
}

fn coerce_numeric_column(dataset: DataSet, column: &str) -> EtlResult<DataSet> {
    let idx = dataset.require_column(column)?;
    let parsed: Vec<Option<Number>> =
        dataset.rows.iter().map(|row| parse_number(&row[idx])).collect();

    let all_int = parsed.iter().flatten().all(|n| matches!(n, Number::Int(_)));
    let (data_type, values) = if all_int {
        let values = parsed
            .into_iter()
            .map(|n| match n {
                Some(Number::Int(v)) => Value::Int64(v),
                _ => Value::Null,
            })
            .collect();
        (DataType::Int64, values)
    } else {
        let values = parsed
            .into_iter()
            .map(|n| match n {
                Some(Number::Int(v)) => Value::Float64(v as f64),
                Some(Number::Float(v)) => Value::Float64(v),
                None => Value::Null,
            })
            .collect();
        (DataType::Float64, values)
    };

    Ok(dataset.with_column(Field::new(column, data_type), values))
}
