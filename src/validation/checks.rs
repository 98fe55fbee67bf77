//! Individual invariant checks.
//!
//! Each check either passes or returns [`EtlError::Validation`] describing the first offending
//! row. Row numbers in messages are 1-based data rows (the header is not counted).

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{EtlError, EtlResult};
use crate::types::{DataSet, Value};

use super::Invariant;

/// `local-part@domain.tld`, matched from the start of the value.
pub const EMAIL_PATTERN: &str = r"^[^@]+@[^@]+\.[^@]+";

/// The only accepted `status` literals (case-sensitive).
pub const ALLOWED_STATUSES: [&str; 3] = ["completed", "pending", "cancelled"];

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("EMAIL_PATTERN is a valid regex"));

fn violation(check: Invariant, column: &str, message: String) -> EtlError {
    EtlError::Validation {
        check,
        column: column.to_string(),
        message,
    }
}

/// Fails if any value in `column` appears more than once. Nulls count as a value.
pub fn unique_key(dataset: &DataSet, column: &str) -> EtlResult<()> {
    let mut seen = HashMap::with_capacity(dataset.row_count());
    for (row, value) in dataset.column(column)?.enumerate() {
        if let Some(first) = seen.insert(value.key(), row) {
            return Err(violation(
                Invariant::UniqueKey,
                column,
                format!(
                    "duplicate value '{value}' at row {} (first seen at row {})",
                    row + 1,
                    first + 1
                ),
            ));
        }
    }
    Ok(())
}

/// Fails if any of `columns` holds a null in any row. Columns are checked in the given order.
pub fn no_nulls(dataset: &DataSet, columns: &[&str]) -> EtlResult<()> {
    for &column in columns {
        if let Some(row) = dataset.column(column)?.position(Value::is_null) {
            return Err(violation(
                Invariant::NoNulls,
                column,
                format!("null value at row {}", row + 1),
            ));
        }
    }
    Ok(())
}

/// Fails if any of `columns` holds a value `<= 0`.
///
/// Nulls and non-numeric values are violations as well: they cannot be shown to be positive.
pub fn positive_values(dataset: &DataSet, columns: &[&str]) -> EtlResult<()> {
    for &column in columns {
        for (row, value) in dataset.column(column)?.enumerate() {
            let message = match value {
                Value::Null => Some(format!("null value at row {}", row + 1)),
                v => match v.as_f64() {
                    Some(n) if n > 0.0 => None,
                    Some(_) => Some(format!("value {v} <= 0 at row {}", row + 1)),
                    None => Some(format!("non-numeric value '{v}' at row {}", row + 1)),
                },
            };
            if let Some(message) = message {
                return Err(violation(Invariant::PositiveValues, column, message));
            }
        }
    }
    Ok(())
}

/// Fails if any `email` does not look like `local-part@domain.tld` (see [`EMAIL_PATTERN`]).
///
/// Non-string values are stringified before matching.
pub fn valid_email(dataset: &DataSet) -> EtlResult<()> {
    const COLUMN: &str = "email";
    for (row, value) in dataset.column(COLUMN)?.enumerate() {
        let matched = match value {
            Value::Utf8(s) => EMAIL_RE.is_match(s),
            other => EMAIL_RE.is_match(&other.to_string()),
        };
        if !matched {
            return Err(violation(
                Invariant::ValidEmail,
                COLUMN,
                format!("invalid email '{value}' at row {}", row + 1),
            ));
        }
    }
    Ok(())
}

/// Fails if any `status` is not one of [`ALLOWED_STATUSES`].
pub fn allowed_status(dataset: &DataSet) -> EtlResult<()> {
    const COLUMN: &str = "status";
    for (row, value) in dataset.column(COLUMN)?.enumerate() {
        let allowed = value.as_str().is_some_and(|s| ALLOWED_STATUSES.contains(&s));
        if !allowed {
            return Err(violation(
                Invariant::AllowedStatus,
                COLUMN,
                format!(
                    "status '{value}' at row {} is not one of {ALLOWED_STATUSES:?}",
                    row + 1
                ),
            ));
        }
    }
    Ok(())
}

/// Fails if any timestamp in `column` is strictly later than `now`.
///
/// Nulls are skipped (that is [`no_nulls`]' job); non-timestamp values are violations.
pub fn date_not_future(dataset: &DataSet, column: &str, now: NaiveDateTime) -> EtlResult<()> {
    for (row, value) in dataset.column(column)?.enumerate() {
        let message = match value {
            Value::Null => None,
            Value::Timestamp(ts) if *ts > now => Some(format!(
                "future date {value} at row {} (now is {})",
                row + 1,
                Value::Timestamp(now)
            )),
            Value::Timestamp(_) => None,
            other => Some(format!("non-timestamp value '{other}' at row {}", row + 1)),
        };
        if let Some(message) = message {
            return Err(violation(Invariant::DateNotFuture, column, message));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema};
    use chrono::{Duration, NaiveDate};

    fn single(column: &str, data_type: DataType, values: Vec<Value>) -> DataSet {
        DataSet::new(
            Schema::new(vec![Field::new(column, data_type)]),
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    fn text(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::Utf8(s.to_string())).collect()
    }

    fn check_of(err: EtlError) -> (Invariant, String) {
        match err {
            EtlError::Validation { check, column, .. } => (check, column),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn unique_key_reports_duplicate_row() {
        let ds = single("order_id", DataType::Utf8, text(&["1", "2", "1"]));
        let err = unique_key(&ds, "order_id").unwrap_err();
        assert!(err.to_string().contains("duplicate value '1' at row 3 (first seen at row 1)"));
        assert_eq!(check_of(err), (Invariant::UniqueKey, "order_id".to_string()));

        let ok = single("order_id", DataType::Utf8, text(&["1", "2", "3"]));
        assert!(unique_key(&ok, "order_id").is_ok());
    }

    #[test]
    fn no_nulls_reports_first_listed_column_with_a_null() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("email", DataType::Utf8),
                Field::new("order_id", DataType::Utf8),
                Field::new("country", DataType::Utf8),
            ]),
            vec![
                vec![Value::Null, Value::Utf8("1".into()), Value::Null],
                vec![Value::Utf8("a@b.com".into()), Value::Null, Value::Null],
            ],
        );
        let err = no_nulls(&ds, &["order_id", "email"]).unwrap_err();
        assert_eq!(check_of(err), (Invariant::NoNulls, "order_id".to_string()));

        // Columns outside the list are not checked.
        let only_country_null = DataSet::new(
            ds.schema.clone(),
            vec![vec![
                Value::Utf8("a@b.com".into()),
                Value::Utf8("1".into()),
                Value::Null,
            ]],
        );
        assert!(no_nulls(&only_country_null, &["order_id", "email"]).is_ok());
    }

    #[test]
    fn positive_values_rejects_zero_negative_null_and_text() {
        for bad in [Value::Int64(0), Value::Float64(-1.5), Value::Null, Value::Utf8("x".into())] {
            let ds = single("quantity", DataType::Int64, vec![Value::Int64(1), bad]);
            let err = positive_values(&ds, &["quantity"]).unwrap_err();
            assert_eq!(check_of(err), (Invariant::PositiveValues, "quantity".to_string()));
        }
        let ok = single("quantity", DataType::Float64, vec![Value::Float64(0.01)]);
        assert!(positive_values(&ok, &["quantity"]).is_ok());
    }

    #[test]
    fn valid_email_matches_shape() {
        let ok = single("email", DataType::Utf8, text(&["a@b.com", "first.last@sub.example.org"]));
        assert!(valid_email(&ok).is_ok());

        for bad in ["not-an-email", "a@b", "@b.com", "a@@b.com"] {
            let ds = single("email", DataType::Utf8, text(&[bad]));
            let err = valid_email(&ds).unwrap_err();
            assert_eq!(check_of(err), (Invariant::ValidEmail, "email".to_string()));
        }
    }

    #[test]
    fn valid_email_stringifies_non_strings() {
        let ds = single("email", DataType::Int64, vec![Value::Int64(42)]);
        assert!(valid_email(&ds).is_err());
    }

    #[test]
    fn allowed_status_is_exact_and_case_sensitive() {
        let ok = single("status", DataType::Utf8, text(&ALLOWED_STATUSES));
        assert!(allowed_status(&ok).is_ok());

        for bad in ["Completed", "shipped", " pending"] {
            let ds = single("status", DataType::Utf8, text(&[bad]));
            assert!(allowed_status(&ds).is_err());
        }
        let null = single("status", DataType::Utf8, vec![Value::Null]);
        assert!(allowed_status(&null).is_err());
    }

    #[test]
    fn date_equal_to_now_passes_and_one_millisecond_later_fails() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 500)
            .unwrap();

        let at_now = single(
            "order_date",
            DataType::Timestamp,
            vec![Value::Timestamp(now), Value::Null],
        );
        assert!(date_not_future(&at_now, "order_date", now).is_ok());

        let later = single(
            "order_date",
            DataType::Timestamp,
            vec![Value::Timestamp(now + Duration::milliseconds(1))],
        );
        let err = date_not_future(&later, "order_date", now).unwrap_err();
        assert_eq!(check_of(err), (Invariant::DateNotFuture, "order_date".to_string()));
    }

    #[test]
    fn checks_report_missing_columns() {
        let ds = single("other", DataType::Utf8, vec![]);
        let err = valid_email(&ds).unwrap_err();
        assert!(err.to_string().contains("missing required column 'email'"));
    }
}
