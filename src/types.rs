//! Core data model: the in-memory Record Set shared by every pipeline stage.
//!
//! A [`DataSet`] is an ordered list of rows sharing one [`Schema`] (a list of typed [`Field`]s).
//! Stages never mutate a set they were handed by reference; they return a new one.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{EtlError, EtlResult};

/// Rendering used for timestamps in CSV output and error messages.
///
/// Sub-second digits are printed only when the fraction is non-zero.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number. Also used for currency amounts.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Naive date-time, interpreted as UTC.
    Timestamp,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing the shape of every row in a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields (insertion order).
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of the first field named `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value, or a value that failed to coerce.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Naive date-time (UTC).
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value (`Int64` and `Float64` only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Hashable projection used for join keys and uniqueness checks.
    ///
    /// Text that reads as an integer keys as that integer, so `"1"`, `" 1"` and `"01"` collide
    /// with each other and with `Int64(1)`.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Int64(v) => ValueKey::Int64(*v),
            // -0.0 and 0.0 compare equal as floats, so they must share a key.
            Value::Float64(v) if *v == 0.0 => ValueKey::Float64(0.0_f64.to_bits()),
            Value::Float64(v) => ValueKey::Float64(v.to_bits()),
            Value::Bool(v) => ValueKey::Bool(*v),
            Value::Utf8(s) => match s.trim().parse::<i64>() {
                Ok(v) => ValueKey::Int64(v),
                Err(_) => ValueKey::Utf8(s.clone()),
            },
            Value::Timestamp(ts) => ValueKey::Timestamp(*ts),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_DISPLAY_FORMAT)),
        }
    }
}

/// Hashable, comparable form of a [`Value`].
///
/// Floats are keyed by bit pattern, so `NaN` keys only equal the identical `NaN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Utf8(String),
    Timestamp(NaiveDateTime),
}

/// In-memory tabular dataset (the Record Set).
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a column that a stage depends on.
    ///
    /// Returns [`EtlError::MissingColumn`] if the schema has no such field.
    pub fn require_column(&self, name: &str) -> EtlResult<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| EtlError::MissingColumn {
                column: name.to_string(),
                available: self.schema.field_names().map(str::to_owned).collect(),
            })
    }

    /// Iterate the values of one column, top to bottom.
    pub fn column(&self, name: &str) -> EtlResult<impl Iterator<Item = &Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Returns a dataset with `values` stored under `field`.
    ///
    /// If a column with the same name exists it is replaced in place (keeping its position),
    /// otherwise the column is appended.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from the row count.
    pub fn with_column(mut self, field: Field, values: Vec<Value>) -> Self {
        assert!(
            values.len() == self.rows.len(),
            "column '{}' has {} values but dataset has {} rows",
            field.name,
            values.len(),
            self.rows.len()
        );

        match self.schema.index_of(&field.name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
                self.schema.fields[idx] = field;
            }
            None => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
                self.schema.fields.push(field);
            }
        }
        self
    }

    /// Returns a dataset where one column's values are rewritten by `mapper`.
    pub fn map_column<F>(self, name: &str, data_type: DataType, mut mapper: F) -> EtlResult<Self>
    where
        F: FnMut(&Value) -> Value,
    {
        let idx = self.require_column(name)?;
        let values = self.rows.iter().map(|row| mapper(&row[idx])).collect();
        Ok(self.with_column(Field::new(name, data_type), values))
    }
}
