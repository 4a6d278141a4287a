//! Detection poller.
//!
//! One logical stream drives the cycle `Idle → Capturing → AwaitingResponse →
//! Reconciling → Idle`, terminal `Stopped`. Cycles are strictly sequential:
//! the next one is armed a fixed delay after the current one fully resolves,
//! so a slow endpoint slows the polling rate instead of stacking requests.
//!
//! Cancellation is cooperative. Every cycle snapshots the capture generation
//! and active view before capturing; a completion whose snapshot no longer
//! matches is discarded, never applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::capture::CaptureSource;
use crate::detect::{DetectClient, DetectionResult};
use crate::error::HeadcountError;
use crate::state::{AppState, AppView};

/// Delay between the completion of one cycle and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Capturing,
    AwaitingResponse,
    Reconciling,
    Stopped,
}

/// What a single cycle did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A response (success or failure) was reconciled into state.
    Applied,
    /// The stream had no valid frame dimensions yet; no request was sent.
    SkippedNoFrame,
    /// The completion was stale (device switch, view switch or stop) and
    /// was dropped without touching state.
    Discarded,
    Stopped,
}

/// Immutable view of "what the world looked like when this cycle started".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleSnapshot {
    pub generation: u64,
    pub view: AppView,
}

pub struct Poller<C: DetectClient> {
    client: C,
    phase: PollPhase,
    stop: Arc<AtomicBool>,
}

impl<C: DetectClient> Poller<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            phase: PollPhase::Idle,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Shared stop flag; flipping it cancels the loop at the next boundary.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Run exactly one cycle against the source and state.
    pub fn run_cycle(&mut self, source: &mut CaptureSource, state: &mut AppState) -> CycleOutcome {
        if self.is_stopped() {
            self.phase = PollPhase::Stopped;
            return CycleOutcome::Stopped;
        }
        if state.view() != AppView::Camera {
            // Poller is parked while another tab is active.
            self.phase = PollPhase::Idle;
            return CycleOutcome::Discarded;
        }

        let snapshot = CycleSnapshot {
            generation: source.generation(),
            view: state.view(),
        };

        self.phase = PollPhase::Capturing;
        let Some((width, height)) = source.native_dimensions() else {
            self.phase = PollPhase::Idle;
            return CycleOutcome::SkippedNoFrame;
        };
        if width == 0 || height == 0 {
            self.phase = PollPhase::Idle;
            return CycleOutcome::SkippedNoFrame;
        }

        let submission = source.snapshot().and_then(|frame| frame.encode_jpeg());
        let result = match submission {
            Ok(jpeg) => {
                self.phase = PollPhase::AwaitingResponse;
                self.client.detect(&jpeg)
            }
            Err(err) => Err(err),
        };

        self.complete_cycle(snapshot, result, source, state)
    }

    /// Reconcile a finished cycle. Split out so the staleness guard is
    /// directly testable: callers hand in the snapshot taken at capture time
    /// and the guard compares it against the world as it is now.
    pub fn complete_cycle(
        &mut self,
        snapshot: CycleSnapshot,
        result: Result<DetectionResult, HeadcountError>,
        source: &CaptureSource,
        state: &mut AppState,
    ) -> CycleOutcome {
        if self.is_stopped() {
            self.phase = PollPhase::Stopped;
            return CycleOutcome::Stopped;
        }
        if source.generation() != snapshot.generation || state.view() != snapshot.view {
            log::debug!(
                "discarding stale completion (gen {} -> {})",
                snapshot.generation,
                source.generation()
            );
            self.phase = PollPhase::Idle;
            return CycleOutcome::Discarded;
        }

        self.phase = PollPhase::Reconciling;
        match result {
            Ok(result) => state.apply_success(result),
            Err(err) => {
                log::warn!("poll cycle failed: {}", err);
                state.apply_failure(&err);
            }
        }
        self.phase = PollPhase::Idle;
        CycleOutcome::Applied
    }

    /// Self-re-arming loop: each cycle completes fully, then the fixed delay
    /// elapses, then the next cycle starts. Returns when stopped.
    pub fn run(
        &mut self,
        source: &mut CaptureSource,
        state: &mut AppState,
        interval: Duration,
        mut on_cycle: impl FnMut(&CycleOutcome, &CaptureSource, &AppState),
    ) {
        loop {
            let outcome = self.run_cycle(source, state);
            if outcome == CycleOutcome::Stopped {
                return;
            }
            on_cycle(&outcome, source, state);
            std::thread::sleep(interval);
            if self.is_stopped() {
                self.phase = PollPhase::Stopped;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticBackend;
    use crate::state::AppState;

    struct ScriptedClient {
        responses: Vec<Result<DetectionResult, HeadcountError>>,
        calls: usize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<DetectionResult, HeadcountError>>) -> Self {
            Self {
                responses,
                calls: 0,
            }
        }
    }

    impl DetectClient for ScriptedClient {
        fn detect(&mut self, _jpeg: &[u8]) -> Result<DetectionResult, HeadcountError> {
            let i = self.calls.min(self.responses.len() - 1);
            self.calls += 1;
            self.responses[i].clone()
        }
    }

    fn count_only(count: u32) -> Result<DetectionResult, HeadcountError> {
        Ok(DetectionResult {
            count,
            boxes: Vec::new(),
            error: None,
        })
    }

    fn open_source() -> CaptureSource {
        let mut source =
            CaptureSource::new(Box::new(SyntheticBackend::new("stub://cam", 32, 24)));
        source.open(0).unwrap();
        source
    }

    #[test]
    fn cycle_applies_response_and_returns_to_idle() {
        let mut source = open_source();
        let mut state = AppState::default();
        let mut poller = Poller::new(ScriptedClient::new(vec![count_only(5)]));

        let outcome = poller.run_cycle(&mut source, &mut state);
        assert_eq!(outcome, CycleOutcome::Applied);
        assert_eq!(state.display_count(), Some(5));
        assert_eq!(poller.phase(), PollPhase::Idle);
    }

    #[test]
    fn cycle_skips_when_source_closed() {
        let mut source = open_source();
        source.close();
        let mut state = AppState::default();
        let mut poller = Poller::new(ScriptedClient::new(vec![count_only(5)]));

        assert_eq!(
            poller.run_cycle(&mut source, &mut state),
            CycleOutcome::SkippedNoFrame
        );
        assert_eq!(state.display_count(), None);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut source = open_source();
        let mut state = AppState::default();
        let mut poller = Poller::new(ScriptedClient::new(vec![count_only(5)]));

        let stale = CycleSnapshot {
            generation: source.generation().wrapping_sub(1),
            view: AppView::Camera,
        };
        let outcome = poller.complete_cycle(stale, count_only(9), &source, &mut state);
        assert_eq!(outcome, CycleOutcome::Discarded);
        assert_eq!(state.display_count(), None);
    }

    #[test]
    fn stopped_poller_never_reconciles() {
        let mut source = open_source();
        let mut state = AppState::default();
        let mut poller = Poller::new(ScriptedClient::new(vec![count_only(5)]));
        poller.stop_handle().store(true, Ordering::SeqCst);

        assert_eq!(
            poller.run_cycle(&mut source, &mut state),
            CycleOutcome::Stopped
        );
        assert_eq!(poller.phase(), PollPhase::Stopped);
        assert_eq!(state.display_count(), None);
    }
}
