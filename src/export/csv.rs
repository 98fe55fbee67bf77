//! CSV export implementation.

use std::path::Path;

use crate::error::EtlResult;
use crate::types::DataSet;

/// Write `dataset` as headered CSV.
///
/// Nulls are written as empty cells; timestamps as `YYYY-MM-DD HH:MM:SS`.
pub fn write_csv(dataset: &DataSet, path: impl AsRef<Path>) -> EtlResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_csv_to_writer(dataset, &mut wtr)?;
    wtr.flush()?;
    Ok(())
}

/// Write `dataset` to an existing CSV writer.
pub fn write_csv_to_writer<W: std::io::Write>(
    dataset: &DataSet,
    wtr: &mut csv::Writer<W>,
) -> EtlResult<()> {
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema, Value};

    #[test]
    fn writes_header_and_rows() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("order_id", DataType::Utf8),
                Field::new("total_amount", DataType::Float64),
                Field::new("country", DataType::Utf8),
                Field::new("vip", DataType::Bool),
            ]),
            vec![
                vec![
                    Value::Utf8("1".into()),
                    Value::Float64(12.5),
                    Value::Utf8("US, East".into()),
                    Value::Bool(false),
                ],
                vec![Value::Utf8("2".into()), Value::Null, Value::Null, Value::Bool(true)],
            ],
        );

        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv_to_writer(&ds, &mut wtr).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

        assert_eq!(
            out,
            "order_id,total_amount,country,vip\n1,12.5,\"US, East\",false\n2,,,true\n"
        );
    }
}
