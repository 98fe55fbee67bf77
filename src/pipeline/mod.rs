//! Pipeline orchestrator.
//!
//! [`EtlPipeline`] sequences the stages as a strict state machine:
//!
//! ```text
//! Init → Reading → Normalizing → Enriching → Classifying → Validating → Exporting → Done
//!   └──────────────────────────── any of these ───────────────────────────────→ Failed
//! ```
//!
//! The first error moves the pipeline to [`PipelineState::Failed`], records a
//! [`PipelineFailure`] and is returned to the caller. Nothing is retried, and because the
//! exporter publishes all outputs or none, a failed run leaves no output files behind.
//!
//! The I/O-free core ([`transform_and_validate`]) is usable on its own.

mod observer;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::export::{ExportFormat, ExportTarget, export_all};
use crate::ingestion::ingest_csv_from_path;
use crate::transform::{
    add_total_amount, categorize_vip, convert_types, merge_orders_customers, normalize_country,
    standardize_column_names,
};
use crate::types::{DataSet, Value};
use crate::validation::validate;

pub use observer::{CompositeObserver, PipelineObserver, TracingObserver};

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Reading,
    Normalizing,
    Enriching,
    Classifying,
    Validating,
    Exporting,
    Done,
    Failed,
}

impl PipelineState {
    /// The only state reachable from `self` on success, if any.
    pub fn next(self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Init => Some(Reading),
            Reading => Some(Normalizing),
            Normalizing => Some(Enriching),
            Enriching => Some(Classifying),
            Classifying => Some(Validating),
            Validating => Some(Exporting),
            Exporting => Some(Done),
            Done | Failed => None,
        }
    }

    /// `Done` and `Failed` are terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Init => "init",
            PipelineState::Reading => "reading",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Enriching => "enriching",
            PipelineState::Classifying => "classifying",
            PipelineState::Validating => "validating",
            PipelineState::Exporting => "exporting",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to run: inputs, output base path and the requested primary format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Orders CSV.
    pub orders_path: PathBuf,
    /// Customers CSV.
    pub customers_path: PathBuf,
    /// Extension-agnostic base path; see [`ExportTarget::standard_set`].
    pub output_base: PathBuf,
    /// Format reported as primary. All three standard outputs are written regardless.
    pub format: ExportFormat,
}

impl PipelineRequest {
    /// Create a request with the default primary format (CSV).
    pub fn new(
        orders_path: impl Into<PathBuf>,
        customers_path: impl Into<PathBuf>,
        output_base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orders_path: orders_path.into(),
            customers_path: customers_path.into(),
            output_base: output_base.into(),
            format: ExportFormat::Csv,
        }
    }

    /// Set the primary format.
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }
}

/// Options controlling a run. Use [`Default`] for common cases.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// Reference moment for the future-date check. `None` uses [`local_now`] when the
    /// validation stage starts.
    pub now: Option<NaiveDateTime>,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("observer_set", &self.observer.is_some())
            .field("now", &self.now)
            .finish()
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineFailure {
    /// State the pipeline was in when the error surfaced.
    pub stage: PipelineState,
    /// Error classification.
    pub kind: ErrorKind,
    /// Rendered error message.
    pub message: String,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Rows in the exported record set.
    pub rows: usize,
    /// Rows classified as VIP.
    pub vip_rows: usize,
    /// Format requested as primary.
    pub primary_format: ExportFormat,
    /// Output matching the primary format.
    pub primary_output: PathBuf,
    /// Every published output, in standard order.
    pub outputs: Vec<PathBuf>,
}

impl RunReport {
    /// JSON rendering of the report, for logs.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}

/// A single ETL run.
pub struct EtlPipeline {
    request: PipelineRequest,
    options: PipelineOptions,
    state: PipelineState,
    failure: Option<PipelineFailure>,
}

impl fmt::Debug for EtlPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtlPipeline")
            .field("request", &self.request)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("failure", &self.failure)
            .finish()
    }
}

impl EtlPipeline {
    /// Create a pipeline in [`PipelineState::Init`].
    pub fn new(request: PipelineRequest, options: PipelineOptions) -> Self {
        Self {
            request,
            options,
            state: PipelineState::Init,
            failure: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The recorded failure, once the pipeline is [`PipelineState::Failed`].
    pub fn failure(&self) -> Option<&PipelineFailure> {
        self.failure.as_ref()
    }

    /// The request this pipeline runs.
    pub fn request(&self) -> &PipelineRequest {
        &self.request
    }

    /// Run every stage to completion.
    ///
    /// A pipeline runs once; calling `run` again returns [`EtlError::InvalidTransition`]
    /// without touching the recorded outcome.
    pub fn run(&mut self) -> EtlResult<RunReport> {
        if self.state != PipelineState::Init {
            return Err(EtlError::InvalidTransition {
                from: self.state,
                to: PipelineState::Reading,
            });
        }

        match self.run_stages() {
            Ok(report) => {
                self.advance(PipelineState::Done)?;
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_success(&self.request, &report);
                }
                Ok(report)
            }
            Err(e) => {
                let failure = PipelineFailure {
                    stage: self.state,
                    kind: e.kind(),
                    message: e.to_string(),
                };
                self.enter(PipelineState::Failed);
                if let Some(obs) = self.options.observer.as_ref() {
                    obs.on_failure(&self.request, &failure, &e);
                }
                self.failure = Some(failure);
                Err(e)
            }
        }
    }

    fn run_stages(&mut self) -> EtlResult<RunReport> {
        self.advance(PipelineState::Reading)?;
        let orders = ingest_csv_from_path(&self.request.orders_path)?;
        let customers = ingest_csv_from_path(&self.request.customers_path)?;
        debug!(
            orders = orders.row_count(),
            customers = customers.row_count(),
            "read inputs"
        );

        self.advance(PipelineState::Normalizing)?;
        let (orders, customers) = normalize_inputs(orders, customers)?;

        self.advance(PipelineState::Enriching)?;
        let merged = enrich(orders, customers)?;

        self.advance(PipelineState::Classifying)?;
        let classified = classify(merged)?;

        self.advance(PipelineState::Validating)?;
        let now = self.options.now.unwrap_or_else(local_now);
        validate(&classified, now)?;

        self.advance(PipelineState::Exporting)?;
        let targets = ExportTarget::standard_set(&self.request.output_base)?;
        let outputs = export_all(&classified, &targets)?;

        let primary_output = targets
            .iter()
            .zip(&outputs)
            .find(|(t, _)| t.format == self.request.format)
            .map(|(_, p)| p.clone())
            .unwrap_or_default();

        Ok(RunReport {
            rows: classified.row_count(),
            vip_rows: count_vip(&classified)?,
            primary_format: self.request.format,
            primary_output,
            outputs,
        })
    }

    fn advance(&mut self, to: PipelineState) -> EtlResult<()> {
        if self.state.next() != Some(to) {
            return Err(EtlError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.enter(to);
        Ok(())
    }

    fn enter(&mut self, state: PipelineState) {
        self.state = state;
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_state(&self.request, state);
        }
    }
}

fn normalize_inputs(orders: DataSet, customers: DataSet) -> EtlResult<(DataSet, DataSet)> {
    let orders = convert_types(standardize_column_names(orders))?;
    let customers = standardize_column_names(customers);
    Ok((orders, customers))
}

fn enrich(orders: DataSet, customers: DataSet) -> EtlResult<DataSet> {
    merge_orders_customers(add_total_amount(orders)?, customers)
}

fn classify(merged: DataSet) -> EtlResult<DataSet> {
    categorize_vip(normalize_country(merged)?)
}

fn count_vip(dataset: &DataSet) -> EtlResult<usize> {
    Ok(dataset
        .column("vip")?
        .filter(|v| matches!(v, Value::Bool(true)))
        .count())
}

/// Local wall-clock time, the default reference for the future-date check.
///
/// Order dates carry no zone and are read as local wall time, so they are compared against the
/// local clock rather than UTC.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Normalize, enrich, classify and validate raw record sets without touching the filesystem.
///
/// Returns the record set that would be exported.
pub fn transform_and_validate(
    orders: DataSet,
    customers: DataSet,
    now: NaiveDateTime,
) -> EtlResult<DataSet> {
    let (orders, customers) = normalize_inputs(orders, customers)?;
    let classified = classify(enrich(orders, customers)?)?;
    validate(&classified, now)?;
    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema};
    use crate::validation::Invariant;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn raw(headers: &[&str], rows: &[&[&str]]) -> DataSet {
        DataSet::new(
            Schema::new(headers.iter().map(|h| Field::new(*h, DataType::Utf8)).collect()),
            rows.iter()
                .map(|r| r.iter().map(|s| Value::Utf8(s.to_string())).collect())
                .collect(),
        )
    }

    fn orders(quantity: &str) -> DataSet {
        raw(
            &["Order ID", "Customer ID", "Order Date", "Quantity", "Unit Price", "Status"],
            &[&["1", "10", "2024-01-01", quantity, "5", "completed"]],
        )
    }

    fn customers(email: &str) -> DataSet {
        raw(&["customer_id", "email", "country"], &[&["10", email, " us "]])
    }

    #[test]
    fn state_sequence_is_linear() {
        let mut state = PipelineState::Init;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            seen.push(next);
            state = next;
        }
        assert_eq!(
            seen,
            vec![
                PipelineState::Init,
                PipelineState::Reading,
                PipelineState::Normalizing,
                PipelineState::Enriching,
                PipelineState::Classifying,
                PipelineState::Validating,
                PipelineState::Exporting,
                PipelineState::Done,
            ]
        );
        assert!(PipelineState::Failed.is_terminal());
        assert_eq!(PipelineState::Failed.next(), None);
    }

    #[test]
    fn default_clock_is_local_wall_time() {
        let before = Local::now().naive_local();
        let now = local_now();
        let after = Local::now().naive_local();
        assert!(before <= now && now <= after, "{before} <= {now} <= {after}");
    }

    #[test]
    fn core_produces_expected_row() {
        let out = transform_and_validate(orders("2"), customers("a@b.com"), now()).unwrap();
        assert_eq!(out.row_count(), 1);
        let get = |name: &str| out.column(name).unwrap().next().unwrap().clone();
        assert_eq!(get("total_amount"), Value::Int64(10));
        assert_eq!(get("vip"), Value::Bool(false));
        assert_eq!(get("country"), Value::Utf8("US".to_string()));
    }

    #[test]
    fn core_flags_vip_above_threshold() {
        let out = transform_and_validate(orders("300"), customers("a@b.com"), now()).unwrap();
        assert_eq!(out.column("total_amount").unwrap().next(), Some(&Value::Int64(1500)));
        assert_eq!(out.column("vip").unwrap().next(), Some(&Value::Bool(true)));
    }

    #[test]
    fn core_rejects_invalid_email() {
        let err =
            transform_and_validate(orders("2"), customers("not-an-email"), now()).unwrap_err();
        match err {
            EtlError::Validation { check, column, .. } => {
                assert_eq!(check, Invariant::ValidEmail);
                assert_eq!(column, "email");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn missing_input_fails_in_reading_stage() {
        let dir = tempfile::tempdir().unwrap();
        let request = PipelineRequest::new(
            dir.path().join("nope.csv"),
            dir.path().join("nope_either.csv"),
            dir.path().join("out"),
        );
        let mut pipeline = EtlPipeline::new(request, PipelineOptions::default());

        let err = pipeline.run().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(pipeline.state(), PipelineState::Failed);
        let failure = pipeline.failure().unwrap();
        assert_eq!(failure.stage, PipelineState::Reading);
        assert_eq!(failure.kind, ErrorKind::Io);

        // A pipeline runs once.
        assert!(matches!(
            pipeline.run(),
            Err(EtlError::InvalidTransition { from: PipelineState::Failed, .. })
        ));
        assert_eq!(pipeline.failure().unwrap().stage, PipelineState::Reading);
    }

    #[test]
    fn report_serializes_to_json() {
        let report = RunReport {
            rows: 1,
            vip_rows: 0,
            primary_format: ExportFormat::Parquet,
            primary_output: PathBuf::from("out.parquet"),
            outputs: vec![PathBuf::from("out.csv"), PathBuf::from("out.parquet")],
        };
        let json = report.to_json();
        assert!(json.contains("\"primary_format\":\"parquet\""));
        assert!(json.contains("\"rows\":1"));
    }
}
