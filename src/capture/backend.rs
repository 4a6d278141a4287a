//! Capture backend seam.
//!
//! The platform media layer (browser `mediaDevices` in the original system,
//! V4L2 here) sits behind these traits so the poller and tests never touch
//! hardware directly.

use crate::error::HeadcountError;
use crate::frame::VideoFrame;

/// One enumerable camera. `id` is an opaque backend handle; selection happens
/// by index into the enumerated, ordered list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraDevice {
    pub id: String,
    pub label: String,
}

/// A live frame stream for exactly one device.
pub trait FrameStream: Send {
    /// Capture the current frame.
    fn next_frame(&mut self) -> Result<VideoFrame, HeadcountError>;

    /// Native pixel dimensions, `None` until the stream has learned them.
    /// The poller skips cycles while this is `None`.
    fn native_dimensions(&self) -> Option<(u32, u32)>;

    /// Release the underlying tracks. Idempotent.
    fn close(&mut self);
}

/// Backend that enumerates devices and opens streams.
pub trait CaptureBackend: Send {
    /// Enumerate available devices. Requires one prior permission grant;
    /// fails with `PermissionDenied` when the user declined.
    fn enumerate(&mut self) -> Result<Vec<CameraDevice>, HeadcountError>;

    /// Open a stream on a specific device.
    fn open(&mut self, device: &CameraDevice) -> Result<Box<dyn FrameStream>, HeadcountError>;

    /// Open a stream on the platform default device.
    fn open_default(&mut self) -> Result<Box<dyn FrameStream>, HeadcountError>;
}
