//! Validation gate for the merged record set.
//!
//! [`validate`] runs the invariant battery in a fixed order; the first violated invariant aborts
//! with [`crate::EtlError::Validation`]. There is no row-level rejection: a batch either passes
//! every check or nothing downstream runs.
//!
//! Order (see [`Invariant::ALL`]):
//!
//! 1. [`unique_key`] on `order_id`
//! 2. [`no_nulls`] on `order_id`, `order_date`, `customer_id`, `email`
//! 3. [`positive_values`] on `quantity`, `unit_price`, `total_amount`
//! 4. [`valid_email`]
//! 5. [`allowed_status`]
//! 6. [`date_not_future`] on `order_date`

pub mod checks;

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::error::EtlResult;
use crate::types::DataSet;

pub use checks::{
    ALLOWED_STATUSES, EMAIL_PATTERN, allowed_status, date_not_future, no_nulls, positive_values,
    unique_key, valid_email,
};

/// Column that must be unique across the merged set.
pub const KEY_COLUMN: &str = "order_id";
/// Columns that must never be null.
pub const REQUIRED_COLUMNS: [&str; 4] = ["order_id", "order_date", "customer_id", "email"];
/// Columns that must be strictly positive.
pub const POSITIVE_COLUMNS: [&str; 3] = ["quantity", "unit_price", "total_amount"];
/// Column that must not lie in the future.
pub const DATE_COLUMN: &str = "order_date";

/// One business invariant enforced by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    UniqueKey,
    NoNulls,
    PositiveValues,
    ValidEmail,
    AllowedStatus,
    DateNotFuture,
}

impl Invariant {
    /// Every invariant, in the order the gate evaluates them.
    pub const ALL: [Invariant; 6] = [
        Invariant::UniqueKey,
        Invariant::NoNulls,
        Invariant::PositiveValues,
        Invariant::ValidEmail,
        Invariant::AllowedStatus,
        Invariant::DateNotFuture,
    ];

    /// Stable snake_case name, used in error messages and logs.
    pub fn name(self) -> &'static str {
        match self {
            Invariant::UniqueKey => "unique_key",
            Invariant::NoNulls => "no_nulls",
            Invariant::PositiveValues => "positive_values",
            Invariant::ValidEmail => "valid_email",
            Invariant::AllowedStatus => "allowed_status",
            Invariant::DateNotFuture => "date_not_future",
        }
    }

    /// Run this invariant against `dataset`.
    pub fn check(self, dataset: &DataSet, now: NaiveDateTime) -> EtlResult<()> {
        match self {
            Invariant::UniqueKey => unique_key(dataset, KEY_COLUMN),
            Invariant::NoNulls => no_nulls(dataset, &REQUIRED_COLUMNS),
            Invariant::PositiveValues => positive_values(dataset, &POSITIVE_COLUMNS),
            Invariant::ValidEmail => valid_email(dataset),
            Invariant::AllowedStatus => allowed_status(dataset),
            Invariant::DateNotFuture => date_not_future(dataset, DATE_COLUMN, now),
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run the full battery against the merged record set.
///
/// `now` is the reference moment for [`date_not_future`]; the orchestrator takes it when the
/// validation stage starts.
pub fn validate(dataset: &DataSet, now: NaiveDateTime) -> EtlResult<()> {
    for invariant in Invariant::ALL {
        invariant.check(dataset, now)?;
        debug!(check = %invariant, rows = dataset.row_count(), "invariant holds");
    }
    Ok(())
}
