//! Synthetic capture backend for `stub://` devices.
//!
//! Generates deterministic test-pattern frames without hardware. Used by the
//! test suite and by `headcountd` when configured with a `stub://` device, so
//! the whole pipeline can run on a machine with no camera.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::backend::{CameraDevice, CaptureBackend, FrameStream};
use crate::error::HeadcountError;
use crate::frame::VideoFrame;

/// Builder-style synthetic backend.
pub struct SyntheticBackend {
    devices: Vec<CameraDevice>,
    width: u32,
    height: u32,
    deny_permission: bool,
    broken: HashSet<String>,
    default_broken: bool,
}

impl SyntheticBackend {
    /// One healthy device named after `device_id` (e.g. `stub://classroom`).
    pub fn new(device_id: &str, width: u32, height: u32) -> Self {
        Self {
            devices: vec![CameraDevice {
                id: device_id.to_string(),
                label: format!("Synthetic camera ({})", device_id),
            }],
            width,
            height,
            deny_permission: false,
            broken: HashSet::new(),
            default_broken: false,
        }
    }

    pub fn with_devices(mut self, devices: Vec<CameraDevice>) -> Self {
        self.devices = devices;
        self
    }

    /// Simulate a declined permission prompt.
    pub fn deny_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    /// Mark a device id as failing to open.
    pub fn with_broken_device(mut self, device_id: &str) -> Self {
        self.broken.insert(device_id.to_string());
        self
    }

    /// Make the platform default device fail too.
    pub fn with_broken_default(mut self) -> Self {
        self.default_broken = true;
        self
    }

    fn open_stream(&self, device_id: &str) -> Result<Box<dyn FrameStream>, HeadcountError> {
        if self.broken.contains(device_id) {
            return Err(HeadcountError::Capture(format!(
                "synthetic device {} refused to open",
                device_id
            )));
        }
        Ok(Box::new(SyntheticStream::new(
            device_id.to_string(),
            self.width,
            self.height,
        )))
    }
}

impl CaptureBackend for SyntheticBackend {
    fn enumerate(&mut self) -> Result<Vec<CameraDevice>, HeadcountError> {
        if self.deny_permission {
            return Err(HeadcountError::PermissionDenied);
        }
        Ok(self.devices.clone())
    }

    fn open(&mut self, device: &CameraDevice) -> Result<Box<dyn FrameStream>, HeadcountError> {
        self.open_stream(&device.id)
    }

    fn open_default(&mut self) -> Result<Box<dyn FrameStream>, HeadcountError> {
        if self.default_broken {
            return Err(HeadcountError::Capture(
                "synthetic default device refused to open".to_string(),
            ));
        }
        let default_id = self
            .devices
            .first()
            .map(|d| d.id.clone())
            .unwrap_or_else(|| "stub://default".to_string());
        if self.broken.contains(&default_id) {
            // The default must still work when only the named device is broken.
            return Ok(Box::new(SyntheticStream::new(
                "stub://default".to_string(),
                self.width,
                self.height,
            )));
        }
        self.open_stream(&default_id)
    }
}

/// Deterministic pattern stream. Shares a closed-flag handle so tests can
/// observe track release.
pub struct SyntheticStream {
    device_id: String,
    width: u32,
    height: u32,
    frame_count: u64,
    closed: Arc<AtomicBool>,
}

impl SyntheticStream {
    fn new(device_id: String, width: u32, height: u32) -> Self {
        log::debug!("synthetic stream opened on {}", device_id);
        Self {
            device_id,
            width,
            height,
            frame_count: 0,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle that flips to `true` once the stream's tracks are released.
    pub fn closed_handle(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count) % 256) as u8;
        }
        pixels
    }
}

impl FrameStream for SyntheticStream {
    fn next_frame(&mut self) -> Result<VideoFrame, HeadcountError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HeadcountError::Capture(format!(
                "stream on {} is closed",
                self.device_id
            )));
        }
        self.frame_count += 1;
        VideoFrame::new(self.generate_pixels(), self.width, self.height)
    }

    fn native_dimensions(&self) -> Option<(u32, u32)> {
        if self.closed.load(Ordering::SeqCst) {
            None
        } else {
            Some((self.width, self.height))
        }
    }

    fn close(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            log::debug!("synthetic stream on {} released", self.device_id);
        }
    }
}
