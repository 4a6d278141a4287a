//! Scenario tests for the detection poller.
//!
//! These exercise the reconciliation rule, the failure backoff, the
//! device-switch reset and the staleness guard end to end through the
//! library, with a scripted detection client standing in for the endpoint.

use headcount::{
    AppState, AppView, BoundingBox, CaptureSource, CycleOutcome, CycleSnapshot, DetectClient,
    DetectionResult, HeadcountError, PollPhase, Poller, SyntheticBackend,
};

struct ScriptedClient {
    script: Vec<Result<DetectionResult, HeadcountError>>,
    calls: usize,
    in_flight: bool,
}

impl ScriptedClient {
    fn new(script: Vec<Result<DetectionResult, HeadcountError>>) -> Self {
        Self {
            script,
            calls: 0,
            in_flight: false,
        }
    }
}

impl DetectClient for ScriptedClient {
    fn detect(&mut self, jpeg: &[u8]) -> Result<DetectionResult, HeadcountError> {
        assert!(!jpeg.is_empty(), "poller must submit an encoded frame");
        assert!(
            !self.in_flight,
            "two detection requests in flight simultaneously"
        );
        self.in_flight = true;
        let i = self.calls.min(self.script.len().saturating_sub(1));
        self.calls += 1;
        let result = self.script[i].clone();
        self.in_flight = false;
        result
    }
}

fn response(count: u32, boxes: Vec<BoundingBox>) -> Result<DetectionResult, HeadcountError> {
    Ok(DetectionResult {
        count,
        boxes,
        error: None,
    })
}

fn open_source() -> CaptureSource {
    let mut source = CaptureSource::new(Box::new(SyntheticBackend::new("stub://room", 64, 48)));
    source.open(0).expect("open synthetic stream");
    source
}

#[test]
fn display_count_is_never_negative() {
    let script = vec![
        response(2, vec![]),
        response(0, vec![]),
        response(0, vec![]),
        response(0, vec![]),
        response(0, vec![]),
    ];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    for _ in 0..5 {
        poller.run_cycle(&mut source, &mut state);
        assert!(state.display_count().unwrap_or(0) < u32::MAX);
    }
    // 2 -> 1 -> 0 -> 0 -> 0
    assert_eq!(state.display_count(), Some(0));
}

#[test]
fn zero_reading_decays_from_five_to_four() {
    let script = vec![response(5, vec![]), response(0, vec![])];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.display_count(), Some(5));
    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.display_count(), Some(4));
}

#[test]
fn first_zero_reading_initializes_to_zero() {
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(vec![response(0, vec![])]));

    assert_eq!(state.display_count(), None);
    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.display_count(), Some(0));
}

#[test]
fn positive_reading_snaps_immediately() {
    let script = vec![response(1, vec![]), response(7, vec![])];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    poller.run_cycle(&mut source, &mut state);
    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.display_count(), Some(7));
}

#[test]
fn boxes_are_replaced_wholesale() {
    let first = vec![
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        BoundingBox::new(20.0, 0.0, 30.0, 10.0),
    ];
    let second = vec![BoundingBox::new(5.0, 5.0, 15.0, 15.0)];
    let script = vec![response(2, first), response(1, second.clone())];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.boxes().len(), 2);
    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.boxes(), second.as_slice());
}

#[test]
fn three_failures_force_zero_then_success_resets() {
    let script = vec![
        response(6, vec![BoundingBox::new(0.0, 0.0, 5.0, 5.0)]),
        Err(HeadcountError::RequestTimeout),
        Err(HeadcountError::RequestFailed(502)),
        Err(HeadcountError::Network("connection reset".into())),
        response(3, vec![]),
    ];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.display_count(), Some(6));

    poller.run_cycle(&mut source, &mut state);
    poller.run_cycle(&mut source, &mut state);
    // two failures: stale reading still shown, status carries attempt count
    assert_eq!(state.display_count(), Some(6));
    assert_eq!(state.consecutive_errors(), 2);

    poller.run_cycle(&mut source, &mut state);
    // third failure: fail safe toward undercount
    assert_eq!(state.display_count(), Some(0));
    assert!(state.boxes().is_empty());
    assert!(state.status().unwrap().contains("reconnecting"));

    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.consecutive_errors(), 0);
    assert_eq!(state.display_count(), Some(3));
    assert!(state.status().is_none());
}

#[test]
fn device_switch_clears_count_and_boxes_before_next_poll() {
    let script = vec![response(9, vec![BoundingBox::new(0.0, 0.0, 4.0, 4.0)])];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    poller.run_cycle(&mut source, &mut state);
    assert_eq!(state.display_count(), Some(9));

    let generation = source.open(0).expect("reopen");
    state.on_device_switch(generation);
    assert_eq!(state.display_count(), None);
    assert!(state.boxes().is_empty());
}

#[test]
fn completion_from_before_device_switch_is_discarded() {
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(vec![response(1, vec![])]));

    let snapshot = CycleSnapshot {
        generation: source.generation(),
        view: AppView::Camera,
    };

    // Device switches while the response is in flight.
    let generation = source.open(0).expect("reopen");
    state.on_device_switch(generation);

    let outcome = poller.complete_cycle(snapshot, response(42, vec![]), &source, &mut state);
    assert_eq!(outcome, CycleOutcome::Discarded);
    assert_eq!(state.display_count(), None);
}

#[test]
fn completion_after_view_switch_is_discarded() {
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(vec![response(1, vec![])]));

    let snapshot = CycleSnapshot {
        generation: source.generation(),
        view: AppView::Camera,
    };
    state.on_view_switch(AppView::Stats);

    let outcome = poller.complete_cycle(snapshot, response(8, vec![]), &source, &mut state);
    assert_eq!(outcome, CycleOutcome::Discarded);
    assert_eq!(state.display_count(), None);

    // Parked poller sends no request while another tab is active.
    assert_eq!(
        poller.run_cycle(&mut source, &mut state),
        CycleOutcome::Discarded
    );
}

#[test]
fn requests_are_strictly_sequential() {
    let script = vec![response(1, vec![])];
    let mut source = open_source();
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(script));

    // ScriptedClient asserts on overlap; phase must settle between cycles.
    for _ in 0..10 {
        poller.run_cycle(&mut source, &mut state);
        assert_eq!(poller.phase(), PollPhase::Idle);
    }
}

#[test]
fn no_request_before_dimensions_are_known() {
    let backend = SyntheticBackend::new("stub://room", 64, 48);
    let mut source = CaptureSource::new(Box::new(backend));
    // never opened: no dimensions
    let mut state = AppState::default();
    let mut poller = Poller::new(ScriptedClient::new(vec![response(1, vec![])]));

    assert_eq!(
        poller.run_cycle(&mut source, &mut state),
        CycleOutcome::SkippedNoFrame
    );
    assert_eq!(state.display_count(), None);
}
