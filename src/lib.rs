//! `orders-etl` is a batch ETL pipeline for order records.
//!
//! It reads an orders CSV and a customers CSV, normalizes and enriches them, flags VIP orders,
//! enforces a battery of business invariants, and publishes the result as CSV, uncompressed
//! Parquet and Snappy-compressed Parquet. Either every output is published or none is.
//!
//! ## Stages
//!
//! | stage | module |
//! |-------|--------|
//! | read | [`ingestion`] |
//! | normalize names and types | [`transform::normalize`] |
//! | compute totals, join customers | [`transform::enrich`] |
//! | normalize country, flag VIPs | [`transform::classify`] |
//! | invariant gate | [`validation`] |
//! | write outputs | [`export`] |
//!
//! [`pipeline::EtlPipeline`] runs them in order as a state machine; the `orders-etl` binary wraps
//! it with CLI parsing and file logging ([`logging`]).
//!
//! ## Quick example
//!
//! ```no_run
//! use orders_etl::pipeline::{EtlPipeline, PipelineOptions, PipelineRequest};
//!
//! # fn main() -> Result<(), orders_etl::EtlError> {
//! let request = PipelineRequest::new("data/orders.csv", "data/customers.csv", "out/result");
//! let report = EtlPipeline::new(request, PipelineOptions::default()).run()?;
//! println!("rows={} vip={}", report.rows, report.vip_rows);
//! # Ok(())
//! # }
//! ```
//!
//! All cells are held as [`types::Value`]s; absent values are [`types::Value::Null`].

pub mod error;
pub mod export;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod types;
pub mod validation;

pub use error::{ErrorKind, EtlError, EtlResult};
