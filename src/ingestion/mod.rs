//! Ingestion: read source files into the in-memory [`crate::types::DataSet`].
//!
//! Orders and customers arrive as headered CSV. See [`csv::ingest_csv_from_path`].

pub mod csv;

pub use csv::{NULL_TOKENS, ingest_csv_from_path, ingest_csv_from_reader};
