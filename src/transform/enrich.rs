//! Enricher: derived `total_amount` and the orders ⟕ customers join.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, warn};

use crate::error::EtlResult;
use crate::types::{DataSet, DataType, Field, Schema, Value, ValueKey};

/// Join key shared by orders and customers.
pub const JOIN_KEY: &str = "customer_id";

/// Suffix applied to orders-side columns that also exist on the customers side.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix applied to customers-side columns that also exist on the orders side.
pub const RIGHT_SUFFIX: &str = "_y";

/// Add `total_amount = quantity * unit_price` to every row.
///
/// A null (or non-numeric) operand yields a null total. The column is [`DataType::Int64`] when
/// both operands are integer columns and no product overflows, [`DataType::Float64`] otherwise.
pub fn add_total_amount(dataset: DataSet) -> EtlResult<DataSet> {
    let q_idx = dataset.require_column("quantity")?;
    let p_idx = dataset.require_column("unit_price")?;

    let int_operands = dataset.schema.fields[q_idx].data_type == DataType::Int64
        && dataset.schema.fields[p_idx].data_type == DataType::Int64;

    let int_totals: Option<Vec<Value>> = if int_operands {
        dataset
            .rows
            .iter()
            .map(|row| match (&row[q_idx], &row[p_idx]) {
                (Value::Int64(q), Value::Int64(p)) => q.checked_mul(*p).map(Value::Int64),
                _ => Some(Value::Null),
            })
            .collect()
    } else {
        None
    };

    let (data_type, totals) = match int_totals {
        Some(values) => (DataType::Int64, values),
        None => {
            let values = dataset
                .rows
                .iter()
                .map(|row| match (row[q_idx].as_f64(), row[p_idx].as_f64()) {
                    (Some(q), Some(p)) => Value::Float64(q * p),
                    _ => Value::Null,
                })
                .collect();
            (DataType::Float64, values)
        }
    };

    Ok(dataset.with_column(Field::new("total_amount", data_type), totals))
}

/// Left outer join of `orders` onto `customers` on [`JOIN_KEY`].
///
/// - Every order row is kept, in order; the output has exactly `orders.row_count()` rows.
/// - Output columns are the order columns followed by the customer columns minus the key.
///   Non-key names present on both sides get [`LEFT_SUFFIX`] / [`RIGHT_SUFFIX`].
/// - Orders without a matching customer (including null keys) get nulls in customer columns.
/// - If several customers share a key, the first one in file order is used.
pub fn merge_orders_customers(orders: DataSet, customers: DataSet) -> EtlResult<DataSet> {
    let left_key = orders.require_column(JOIN_KEY)?;
    let right_key = customers.require_column(JOIN_KEY)?;

    let mut index: HashMap<ValueKey, usize> = HashMap::with_capacity(customers.row_count());
    let mut shadowed = 0usize;
    for (i, row) in customers.rows.iter().enumerate() {
        if row[right_key].is_null() {
            continue;
        }
        match index.entry(row[right_key].key()) {
            Entry::Vacant(slot) => {
                slot.insert(i);
            }
            Entry::Occupied(_) => shadowed += 1,
        }
    }
    if shadowed > 0 {
        warn!(
            shadowed,
            "customers has duplicate {JOIN_KEY} values; joining on the first occurrence"
        );
    }

    let right_cols: Vec<usize> = (0..customers.schema.fields.len())
        .filter(|&i| i != right_key)
        .collect();
    let schema = merged_schema(&orders.schema, &customers.schema, left_key, &right_cols);

    let mut matched = 0usize;
    let rows: Vec<Vec<Value>> = orders
        .rows
        .into_iter()
        .map(|mut row| {
            let customer = if row[left_key].is_null() {
                None
            } else {
                index.get(&row[left_key].key()).map(|&i| &customers.rows[i])
            };
            match customer {
                Some(c) => {
                    matched += 1;
                    row.extend(right_cols.iter().map(|&i| c[i].clone()));
                }
                None => row.extend(right_cols.iter().map(|_| Value::Null)),
            }
            row
        })
        .collect();

    debug!(rows = rows.len(), matched, "merged orders with customers");
    Ok(DataSet::new(schema, rows))
}

fn overlaps(name: &str, other: &Schema) -> bool {
    name != JOIN_KEY && other.field_names().any(|n| n == name)
}

fn merged_schema(left: &Schema, right: &Schema, left_key: usize, right_cols: &[usize]) -> Schema {
    let mut fields = Vec::with_capacity(left.fields.len() + right_cols.len());
    for (i, f) in left.fields.iter().enumerate() {
        let name = if i != left_key && overlaps(&f.name, right) {
            format!("{}{LEFT_SUFFIX}", f.name)
        } else {
            f.name.clone()
        };
        fields.push(Field::new(name, f.data_type));
    }
    for &i in right_cols {
        let f = &right.fields[i];
        let name = if overlaps(&f.name, left) {
            format!("{}{RIGHT_SUFFIX}", f.name)
        } else {
            f.name.clone()
        };
        fields.push(Field::new(name, f.data_type));
    }
    Schema::new(fields)
}
