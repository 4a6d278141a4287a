mod client;
mod result;

pub use client::{DetectClient, HttpDetectClient, DEFAULT_REQUEST_TIMEOUT};
pub use result::{BoundingBox, DetectionResult};
