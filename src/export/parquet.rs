//! Parquet export implementation.
//!
//! Every column is written as an `OPTIONAL` leaf so nulls survive the round trip:
//!
//! | [`DataType`] | Parquet physical type | Annotation |
//! |---|---|---|
//! | `Int64` | `INT64` | |
//! | `Float64` | `DOUBLE` | |
//! | `Bool` | `BOOLEAN` | |
//! | `Utf8` | `BYTE_ARRAY` | `UTF8` |
//! | `Timestamp` | `INT64` | `TIMESTAMP_MICROS` |
//!
//! Timestamps keep microsecond precision; finer digits are truncated.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use parquet::basic::{ConvertedType, Repetition, Type as PhysicalType};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Value};

use super::ParquetCompression;

/// Write `dataset` as a single-row-group Parquet file.
pub fn write_parquet(
    dataset: &DataSet,
    path: impl AsRef<Path>,
    compression: ParquetCompression,
) -> EtlResult<()> {
    let schema = Arc::new(parquet_schema(&dataset.schema.fields)?);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(compression.into())
            .build(),
    );
    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, props)?;

    let mut rg = writer.next_row_group()?;
    let mut col_idx: usize = 0;
    while let Some(mut col) = rg.next_column()? {
        let idx = col_idx;
        let field = &dataset.schema.fields[idx];
        let cells = dataset.rows.iter().map(move |row| &row[idx]);
        let defs: Vec<i16> = cells.clone().map(|v| i16::from(!v.is_null())).collect();

        match field.data_type {
            DataType::Int64 => {
                let values = collect_present(field, cells, |v| match v {
                    Value::Int64(x) => Some(*x),
                    _ => None,
                })?;
                col.typed::<Int64Type>().write_batch(&values, Some(&defs), None)?;
            }
            DataType::Float64 => {
                let values = collect_present(field, cells, |v| match v {
                    Value::Float64(x) => Some(*x),
                    Value::Int64(x) => Some(*x as f64),
                    _ => None,
                })?;
                col.typed::<DoubleType>().write_batch(&values, Some(&defs), None)?;
            }
            DataType::Bool => {
                let values = collect_present(field, cells, |v| match v {
                    Value::Bool(x) => Some(*x),
                    _ => None,
                })?;
                col.typed::<BoolType>().write_batch(&values, Some(&defs), None)?;
            }
            DataType::Utf8 => {
                let values = collect_present(field, cells, |v| match v {
                    Value::Utf8(s) => Some(ByteArray::from(s.as_str())),
                    _ => None,
                })?;
                col.typed::<ByteArrayType>().write_batch(&values, Some(&defs), None)?;
            }
            DataType::Timestamp => {
                let values = collect_present(field, cells, |v| match v {
                    Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
                    _ => None,
                })?;
                col.typed::<Int64Type>().write_batch(&values, Some(&defs), None)?;
            }
        }
        col.close()?;
        col_idx += 1;
    }
    rg.close()?;
    writer.close()?;
    Ok(())
}

fn parquet_schema(fields: &[Field]) -> EtlResult<Type> {
    let mut leaves = Vec::with_capacity(fields.len());
    for f in fields {
        let (physical, converted) = match f.data_type {
            DataType::Int64 => (PhysicalType::INT64, ConvertedType::NONE),
            DataType::Float64 => (PhysicalType::DOUBLE, ConvertedType::NONE),
            DataType::Bool => (PhysicalType::BOOLEAN, ConvertedType::NONE),
            DataType::Utf8 => (PhysicalType::BYTE_ARRAY, ConvertedType::UTF8),
            DataType::Timestamp => (PhysicalType::INT64, ConvertedType::TIMESTAMP_MICROS),
        };
        let leaf = Type::primitive_type_builder(&f.name, physical)
            .with_repetition(Repetition::OPTIONAL)
            .with_converted_type(converted)
            .build()?;
        leaves.push(Arc::new(leaf));
    }
    Ok(Type::group_type_builder("schema").with_fields(leaves).build()?)
}

/// Collect the non-null cells of one column, failing on values that do not match the field type.
fn collect_present<'a, T>(
    field: &Field,
    cells: impl Iterator<Item = &'a Value>,
    extract: impl Fn(&Value) -> Option<T>,
) -> EtlResult<Vec<T>> {
    let mut out = Vec::new();
    for (row, v) in cells.enumerate() {
        if v.is_null() {
            continue;
        }
        match extract(v) {
            Some(x) => out.push(x),
            None => {
                return Err(ParquetError::General(format!(
                    "column '{}' declared {:?} but row {} holds {v:?}",
                    field.name,
                    field.data_type,
                    row + 1
                ))
                .into());
            }
        }
    }
    Ok(out)
}
