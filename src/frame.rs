//! In-memory video frames.
//!
//! The capture layer hands frames to the poller as packed RGB. Frames are
//! transient: one is snapshotted per poll cycle, encoded, submitted and
//! dropped. Nothing here touches disk.

use image::{DynamicImage, RgbImage};
use std::io::Cursor;

use crate::error::HeadcountError;

/// One captured frame, packed RGB8.
#[derive(Debug)]
pub struct VideoFrame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    /// Create a frame from packed RGB data. Called only by capture backends.
    ///
    /// Returns `Capture` when the buffer does not match `width * height * 3`.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, HeadcountError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(HeadcountError::Capture(format!(
                "frame buffer is {} bytes, expected {} for {}x{} rgb",
                pixels.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Encode the frame as JPEG for submission to the detection endpoint.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>, HeadcountError> {
        let rgb = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| HeadcountError::Capture("frame buffer shape mismatch".to_string()))?;
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .map_err(|e| HeadcountError::Capture(format!("jpeg encode failed: {}", e)))?;
        Ok(out.into_inner())
    }
}

/// Decode a JPEG buffer back into a frame. Used by tests and tooling.
pub fn decode_jpeg(bytes: &[u8]) -> Result<VideoFrame, HeadcountError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| HeadcountError::Capture(format!("jpeg decode failed: {}", e)))?;
    let rgb = decoded.into_rgb8();
    let (width, height) = (rgb.width(), rgb.height());
    VideoFrame::new(rgb.into_raw(), width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        let err = VideoFrame::new(vec![0u8; 10], 4, 4).unwrap_err();
        assert!(matches!(err, HeadcountError::Capture(_)));
    }

    #[test]
    fn jpeg_round_trip_preserves_dimensions() {
        let frame = VideoFrame::new(vec![128u8; 16 * 8 * 3], 16, 8).unwrap();
        let jpeg = frame.encode_jpeg().unwrap();
        assert!(!jpeg.is_empty());

        let decoded = decode_jpeg(&jpeg).unwrap();
        assert_eq!(decoded.width, 16);
        assert_eq!(decoded.height, 8);
    }
}
