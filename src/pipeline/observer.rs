use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::EtlError;

use super::{PipelineFailure, PipelineRequest, PipelineState, RunReport};

/// Observer interface for pipeline progress and outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts. Every callback has a no-op default.
pub trait PipelineObserver: Send + Sync {
    /// Called each time the pipeline enters a new state (including `Done` and `Failed`).
    fn on_state(&self, _request: &PipelineRequest, _state: PipelineState) {}

    /// Called once when every output has been published.
    fn on_success(&self, _request: &PipelineRequest, _report: &RunReport) {}

    /// Called once when the run aborts.
    fn on_failure(
        &self,
        _request: &PipelineRequest,
        _failure: &PipelineFailure,
        _error: &EtlError,
    ) {
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_state(&self, request: &PipelineRequest, state: PipelineState) {
        for o in &self.observers {
            o.on_state(request, state);
        }
    }

    fn on_success(&self, request: &PipelineRequest, report: &RunReport) {
        for o in &self.observers {
            o.on_success(request, report);
        }
    }

    fn on_failure(&self, request: &PipelineRequest, failure: &PipelineFailure, error: &EtlError) {
        for o in &self.observers {
            o.on_failure(request, failure, error);
        }
    }
}

/// Reports pipeline events as `tracing` events: stage changes at `debug`, the outcome at
/// `info` or `error`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_state(&self, request: &PipelineRequest, state: PipelineState) {
        match state {
            PipelineState::Reading => info!(
                "ETL run started: orders={} customers={}",
                request.orders_path.display(),
                request.customers_path.display()
            ),
            _ => debug!(state = %state, "entered stage"),
        }
    }

    fn on_success(&self, _request: &PipelineRequest, report: &RunReport) {
        let outputs: Vec<String> = report.outputs.iter().map(|p| p.display().to_string()).collect();
        info!(
            "ETL run finished: rows={} vip_rows={} outputs={}",
            report.rows,
            report.vip_rows,
            outputs.join(", ")
        );
    }

    fn on_failure(&self, _request: &PipelineRequest, failure: &PipelineFailure, error: &EtlError) {
        error!(
            "ETL run failed during {} ({:?}): {error}",
            failure.stage, failure.kind
        );
    }
}
