//! Detection wire types.
//!
//! These mirror the detection endpoint's JSON response exactly:
//! `{ "count": n, "boxes": [{xmin,ymin,xmax,ymax}, ...], "error": "..."? }`.
//! Results are transient; each poll cycle replaces the previous one wholesale.

use serde::{Deserialize, Serialize};

/// One detected person, in source-frame pixel coordinates.
///
/// Invariant: `xmax >= xmin` and `ymax >= ymin`. Responses violating this are
/// rejected as malformed before they reach the poller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.xmax >= self.xmin
            && self.ymax >= self.ymin
            && self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }
}

/// Response of the detection endpoint for a single submitted frame.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Number of people detected in the frame.
    pub count: u32,
    /// Bounding boxes, one per detection, in submission order.
    #[serde(default)]
    pub boxes: Vec<BoundingBox>,
    /// Detector-side failure reported in-band with a 2xx status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    /// Validate the box invariants. The count itself is not cross-checked
    /// against `boxes.len()`: the endpoint owns that relationship.
    pub fn validate(&self) -> Result<(), String> {
        for (i, b) in self.boxes.iter().enumerate() {
            if !b.is_valid() {
                return Err(format!(
                    "box #{} is degenerate: ({}, {}) .. ({}, {})",
                    i + 1,
                    b.xmin,
                    b.ymin,
                    b.xmax,
                    b.ymax
                ));
            }
        }
        Ok(())
    }
}
