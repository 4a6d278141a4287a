//! Error taxonomy for the capture source, detection client and poller.
//!
//! Every variant is recovered locally: the poller counts it as a cycle
//! failure and the capture source surfaces it as a transient status. None of
//! these abort the process.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HeadcountError {
    /// The platform refused the camera permission grant.
    #[error("camera permission denied")]
    PermissionDenied,

    /// Neither the requested device nor the platform default could be opened.
    #[error("no camera available")]
    NoCameraAvailable,

    /// The detection request exceeded the hard timeout.
    #[error("detection request timed out")]
    RequestTimeout,

    /// The detection endpoint answered with a non-2xx status.
    #[error("detection request failed with status {0}")]
    RequestFailed(u16),

    /// The response body could not be decoded into a detection result.
    #[error("malformed detection response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure that is not a timeout (DNS, refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered 2xx but reported a detector-side error in-band.
    #[error("detector reported error: {0}")]
    DetectorReported(String),

    /// Frame acquisition or encoding failed on an open stream.
    #[error("capture error: {0}")]
    Capture(String),
}
