//! Classroom headcount client.
//!
//! This crate is the headless core of a classroom attendance counter: it
//! owns one camera stream, polls an external detection endpoint with frame
//! snapshots, smooths the returned count, renders box overlays, and records
//! counts against an attendance backend.
//!
//! # Architecture
//!
//! - `capture`: one exclusively-owned frame stream, selectable among
//!   enumerated devices, with fallback-to-default on open failure
//! - `detect`: detection endpoint wire types and HTTP client
//! - `state`: explicit state container; one transition function per event
//! - `poller`: the cycle state machine (snapshot, submit, reconcile,
//!   re-arm); stale completions are discarded via generation snapshots
//! - `overlay`: box rendering aligned to the stream's native resolution
//! - `attendance`: REST client for the persistence backend
//! - `session`: credential-verification seam and role-gated views
//!
//! The detection model itself and the persistence backend are external
//! collaborators; everything here tolerates their failure and degrades the
//! displayed count toward zero rather than showing stale positives.

pub mod attendance;
pub mod capture;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod poller;
pub mod session;
pub mod state;

pub use attendance::{AttendanceClient, AttendanceRecord, DailyMax, LessonSeriesPoint};
pub use capture::{CameraDevice, CaptureBackend, CaptureSource, FrameStream, SyntheticBackend};
pub use config::HeadcountConfig;
pub use detect::{BoundingBox, DetectClient, DetectionResult, HttpDetectClient};
pub use error::HeadcountError;
pub use frame::VideoFrame;
pub use overlay::{render_boxes, OverlaySurface};
pub use poller::{CycleOutcome, CycleSnapshot, PollPhase, Poller, DEFAULT_POLL_INTERVAL};
pub use session::{CredentialVerifier, HttpCredentialVerifier, Role, Session};
pub use state::{reconcile, AppState, AppView, DEFAULT_FAILURE_THRESHOLD};
