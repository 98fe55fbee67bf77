use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use orders_etl::pipeline::{
    CompositeObserver, EtlPipeline, PipelineFailure, PipelineObserver, PipelineOptions,
    PipelineRequest, PipelineState, RunReport,
};
use orders_etl::{ErrorKind, EtlError};

#[derive(Default)]
struct RecordingObserver {
    states: Mutex<Vec<PipelineState>>,
    successes: Mutex<Vec<usize>>,
    failures: Mutex<Vec<(PipelineState, ErrorKind)>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_state(&self, _request: &PipelineRequest, state: PipelineState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_success(&self, _request: &PipelineRequest, report: &RunReport) {
        self.successes.lock().unwrap().push(report.rows);
    }

    fn on_failure(&self, _request: &PipelineRequest, failure: &PipelineFailure, _error: &EtlError) {
        self.failures.lock().unwrap().push((failure.stage, failure.kind));
    }
}

fn options(observer: Arc<dyn PipelineObserver>) -> PipelineOptions {
    PipelineOptions {
        observer: Some(observer),
        now: NaiveDate::from_ymd_opt(2025, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    }
}

#[test]
fn observer_sees_every_stage_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let request = PipelineRequest::new(
        "tests/fixtures/orders.csv",
        "tests/fixtures/customers.csv",
        dir.path().join("result"),
    );

    EtlPipeline::new(request, options(obs.clone())).run().unwrap();

    assert_eq!(
        *obs.states.lock().unwrap(),
        vec![
            PipelineState::Reading,
            PipelineState::Normalizing,
            PipelineState::Enriching,
            PipelineState::Classifying,
            PipelineState::Validating,
            PipelineState::Exporting,
            PipelineState::Done,
        ]
    );
    assert_eq!(*obs.successes.lock().unwrap(), vec![3]);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_once() {
    let dir = tempfile::tempdir().unwrap();
    let obs = Arc::new(RecordingObserver::default());
    let request = PipelineRequest::new(
        dir.path().join("missing_orders.csv"),
        "tests/fixtures/customers.csv",
        dir.path().join("result"),
    );

    let mut pipeline = EtlPipeline::new(request, options(obs.clone()));
    assert!(pipeline.run().is_err());

    assert_eq!(
        *obs.states.lock().unwrap(),
        vec![PipelineState::Reading, PipelineState::Failed]
    );
    assert_eq!(
        *obs.failures.lock().unwrap(),
        vec![(PipelineState::Reading, ErrorKind::Io)]
    );
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn composite_observer_fans_out() {
    let dir = tempfile::tempdir().unwrap();
    let a = Arc::new(RecordingObserver::default());
    let b = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn PipelineObserver>> = vec![a.clone(), b.clone()];
    let composite = Arc::new(CompositeObserver::new(observers));
    let request = PipelineRequest::new(
        "tests/fixtures/orders.csv",
        "tests/fixtures/customers.csv",
        dir.path().join("result"),
    );

    EtlPipeline::new(request, options(composite)).run().unwrap();

    assert_eq!(*a.successes.lock().unwrap(), vec![3]);
    assert_eq!(*b.successes.lock().unwrap(), vec![3]);
    assert_eq!(a.states.lock().unwrap().len(), b.states.lock().unwrap().len());
}
