//! Application state container.
//!
//! Count, boxes, failure streak, status and the active view live here as one
//! explicit state struct with a transition function per event: poll success,
//! poll failure, device switch, view switch. The poller owns when transitions
//! fire; this module owns what they do.

use crate::detect::{BoundingBox, DetectionResult};
use crate::error::HeadcountError;

/// Role-tabbed views of the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppView {
    Camera,
    Stats,
    Admin,
    Teacher,
}

/// Consecutive failures after which the displayed count degrades to zero
/// rather than showing a stale positive reading.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug)]
pub struct AppState {
    /// Smoothed count shown to the user. `None` until the first reading
    /// after startup or a device switch.
    display_count: Option<u32>,
    boxes: Vec<BoundingBox>,
    consecutive_errors: u32,
    status: Option<String>,
    view: AppView,
    /// Capture generation the current detection state belongs to.
    device_generation: u64,
    failure_threshold: u32,
}

impl AppState {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            display_count: None,
            boxes: Vec::new(),
            consecutive_errors: 0,
            status: None,
            view: AppView::Camera,
            device_generation: 0,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn display_count(&self) -> Option<u32> {
        self.display_count
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn view(&self) -> AppView {
        self.view
    }

    pub fn device_generation(&self) -> u64 {
        self.device_generation
    }

    /// Poll success: reconcile the count, replace boxes wholesale, clear the
    /// failure streak and any transient status.
    pub fn apply_success(&mut self, result: DetectionResult) {
        self.display_count = Some(reconcile(self.display_count, result.count));
        self.boxes = result.boxes;
        self.consecutive_errors = 0;
        self.status = None;
    }

    /// Poll failure: bump the streak and surface a transient status. At the
    /// threshold the count is forced to zero and boxes are cleared, failing
    /// safe toward undercount instead of a stale positive reading.
    pub fn apply_failure(&mut self, err: &HeadcountError) {
        self.consecutive_errors += 1;
        if self.consecutive_errors >= self.failure_threshold {
            self.display_count = Some(0);
            self.boxes.clear();
            self.status = Some(format!(
                "reconnecting to detector ({} failures): {}",
                self.consecutive_errors, err
            ));
        } else {
            self.status = Some(format!(
                "detection failed (attempt {}): {}",
                self.consecutive_errors, err
            ));
        }
    }

    /// Device switch: stale results must never be attributed to the new
    /// feed, so count and boxes reset before the next successful poll. The
    /// failure streak resets too; the new stream does not inherit backoff.
    pub fn on_device_switch(&mut self, generation: u64) {
        self.display_count = None;
        self.boxes.clear();
        self.consecutive_errors = 0;
        self.status = None;
        self.device_generation = generation;
    }

    /// View switch. Leaving the camera view is a cancellation point: the
    /// poller's snapshot guard discards any in-flight completion.
    pub fn on_view_switch(&mut self, view: AppView) {
        self.view = view;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

/// The smoothing rule, exactly as the original front-end behaves:
/// - any positive reading is trusted immediately,
/// - a zero reading decays the displayed count by one per cycle instead of
///   dropping it in one step,
/// - the first reading ever initializes to zero.
///
/// The asymmetry is deliberate and preserved as-is.
pub fn reconcile(prev: Option<u32>, new: u32) -> u32 {
    if new > 0 {
        return new;
    }
    match prev {
        None => 0,
        Some(p) => p.saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_reading_snaps_up() {
        assert_eq!(reconcile(None, 7), 7);
        assert_eq!(reconcile(Some(0), 7), 7);
        assert_eq!(reconcile(Some(12), 7), 7);
    }

    #[test]
    fn zero_reading_decays_by_one() {
        assert_eq!(reconcile(Some(5), 0), 4);
        assert_eq!(reconcile(Some(1), 0), 0);
        assert_eq!(reconcile(Some(0), 0), 0);
    }

    #[test]
    fn first_zero_reading_initializes() {
        assert_eq!(reconcile(None, 0), 0);
    }

    #[test]
    fn failure_below_threshold_keeps_count() {
        let mut state = AppState::new(3);
        state.apply_success(DetectionResult {
            count: 6,
            boxes: vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)],
            error: None,
        });

        state.apply_failure(&HeadcountError::RequestTimeout);
        state.apply_failure(&HeadcountError::RequestTimeout);
        assert_eq!(state.display_count(), Some(6));
        assert_eq!(state.boxes().len(), 1);
        assert!(state.status().unwrap().contains("attempt 2"));
    }

    #[test]
    fn threshold_forces_zero_and_clears_boxes() {
        let mut state = AppState::new(3);
        state.apply_success(DetectionResult {
            count: 6,
            boxes: vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0)],
            error: None,
        });

        for _ in 0..3 {
            state.apply_failure(&HeadcountError::RequestFailed(502));
        }
        assert_eq!(state.display_count(), Some(0));
        assert!(state.boxes().is_empty());
        assert!(state.status().unwrap().contains("reconnecting"));

        state.apply_success(DetectionResult::default());
        assert_eq!(state.consecutive_errors(), 0);
        assert!(state.status().is_none());
    }

    #[test]
    fn device_switch_resets_detection_state() {
        let mut state = AppState::new(3);
        state.apply_success(DetectionResult {
            count: 4,
            boxes: vec![BoundingBox::new(1.0, 1.0, 2.0, 2.0)],
            error: None,
        });

        state.on_device_switch(9);
        assert_eq!(state.display_count(), None);
        assert!(state.boxes().is_empty());
        assert_eq!(state.device_generation(), 9);
    }
}
