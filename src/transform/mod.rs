//! Pure data-shaping stages.
//!
//! Every stage takes an owned [`crate::types::DataSet`] and returns a new one, so ownership moves
//! forward through the pipeline:
//!
//! - [`normalize`]: [`standardize_column_names()`], [`convert_types()`]
//! - [`enrich`]: [`add_total_amount()`], [`merge_orders_customers()`]
//! - [`classify`]: [`normalize_country()`], [`categorize_vip()`]
//!
//! ## Example: orders through to VIP flags
//!
//! ```rust
//! use orders_etl::transform::{
//!     add_total_amount, categorize_vip, convert_types, merge_orders_customers,
//!     normalize_country, standardize_column_names,
//! };
//! use orders_etl::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let text = |s: &str| Value::Utf8(s.to_string());
//! let orders = DataSet::new(
//!     Schema::new(
//!         ["Order ID", "Customer ID", "Order Date", "Quantity", "Unit Price", "Status"]
//!             .into_iter()
//!             .map(|n| Field::new(n, DataType::Utf8))
//!             .collect(),
//!     ),
//!     vec![vec![
//!         text("1"),
//!         text("10"),
//!         text("2024-01-01"),
//!         text("300"),
//!         text("5"),
//!         text("completed"),
//!     ]],
//! );
//! let customers = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("customer_id", DataType::Utf8),
//!         Field::new("email", DataType::Utf8),
//!         Field::new("country", DataType::Utf8),
//!     ]),
//!     vec![vec![text("10"), text("a@b.com"), text(" us ")]],
//! );
//!
//! let orders = add_total_amount(convert_types(standardize_column_names(orders))?)?;
//! let merged = merge_orders_customers(orders, standardize_column_names(customers))?;
//! let classified = categorize_vip(normalize_country(merged)?)?;
//!
//! let vip = classified.column("vip")?.next().cloned();
//! assert_eq!(vip, Some(Value::Bool(true)));
//! # Ok::<(), orders_etl::EtlError>(())
//! ```

pub mod classify;
pub mod enrich;
pub mod normalize;

pub use classify::{VIP_THRESHOLD, categorize_vip, normalize_country};
pub use enrich::{JOIN_KEY, add_total_amount, merge_orders_customers};
pub use normalize::{convert_types, parse_timestamp, standardize_column_names};
