//! Capture source: one exclusively-owned video stream.
//!
//! `CaptureSource` wraps a backend and enforces the stream lifecycle:
//! - the device list is enumerated once and read-only thereafter,
//! - at most one stream is open at a time; opening a new device releases the
//!   previous stream's tracks first,
//! - a failed open falls back exactly once to the platform default device,
//!   and a failed fallback leaves no stream open,
//! - every successful open bumps a generation counter, which the poller
//!   snapshots to discard results that arrive after a device switch.

mod backend;
pub mod synthetic;
#[cfg(feature = "capture-v4l2")]
pub mod v4l2;

pub use backend::{CameraDevice, CaptureBackend, FrameStream};
pub use synthetic::SyntheticBackend;
#[cfg(feature = "capture-v4l2")]
pub use v4l2::{V4l2Backend, V4l2Settings};

use crate::error::HeadcountError;
use crate::frame::VideoFrame;

pub struct CaptureSource {
    backend: Box<dyn CaptureBackend>,
    devices: Option<Vec<CameraDevice>>,
    stream: Option<Box<dyn FrameStream>>,
    selected: Option<usize>,
    generation: u64,
}

impl CaptureSource {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            devices: None,
            stream: None,
            selected: None,
            generation: 0,
        }
    }

    /// Enumerate devices. The first call hits the backend (and may surface
    /// `PermissionDenied`); later calls return the cached ordered list.
    pub fn list_devices(&mut self) -> Result<&[CameraDevice], HeadcountError> {
        if self.devices.is_none() {
            let devices = self.backend.enumerate()?;
            self.devices = Some(devices);
        }
        Ok(self.devices.as_deref().unwrap_or_default())
    }

    /// Open the device at `index`, releasing any previous stream first.
    ///
    /// On failure the platform default is tried once; if that fails too,
    /// `NoCameraAvailable` is returned and no stream is left open. Returns
    /// the new generation on success so callers can invalidate downstream
    /// detection state tied to the old feed.
    pub fn open(&mut self, index: usize) -> Result<u64, HeadcountError> {
        self.close();

        let device = self.list_devices()?.get(index).cloned();
        let primary = match device {
            Some(ref device) => self.backend.open(device),
            None => Err(HeadcountError::Capture(format!(
                "device index {} out of range",
                index
            ))),
        };

        let stream = match primary {
            Ok(stream) => stream,
            Err(HeadcountError::PermissionDenied) => return Err(HeadcountError::PermissionDenied),
            Err(err) => {
                log::warn!("opening device {} failed ({}); trying default", index, err);
                self.backend
                    .open_default()
                    .map_err(|fallback_err| match fallback_err {
                        HeadcountError::PermissionDenied => HeadcountError::PermissionDenied,
                        _ => HeadcountError::NoCameraAvailable,
                    })?
            }
        };

        self.stream = Some(stream);
        self.selected = Some(index);
        self.generation += 1;
        log::info!("capture stream open (device {}, gen {})", index, self.generation);
        Ok(self.generation)
    }

    /// Release the current stream's tracks. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            self.generation += 1;
        }
        self.selected = None;
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Monotonic generation, bumped on every open and close. Poll cycles
    /// snapshot this at capture time and discard completions when it moved.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Native pixel dimensions of the open stream, if known yet.
    pub fn native_dimensions(&self) -> Option<(u32, u32)> {
        self.stream.as_ref().and_then(|s| s.native_dimensions())
    }

    /// Snapshot the current frame.
    pub fn snapshot(&mut self) -> Result<VideoFrame, HeadcountError> {
        match self.stream.as_mut() {
            Some(stream) => stream.next_frame(),
            None => Err(HeadcountError::NoCameraAvailable),
        }
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.close();
    }
}
