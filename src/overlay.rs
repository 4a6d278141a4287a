//! Overlay renderer.
//!
//! Draws the latest box list onto an RGBA surface aligned to the capture
//! stream's native pixel dimensions (never the displayed size). Rendering is
//! a pure function of `(boxes, width, height)`; the surface holds no state
//! beyond its pixels, and an empty box list just clears it.

use image::{Rgba, RgbaImage};

use crate::detect::BoundingBox;

const BOX_COLOR: Rgba<u8> = Rgba([76, 175, 80, 255]);
const TAG_SIZE: u32 = 6;

pub struct OverlaySurface {
    image: RgbaImage,
}

impl OverlaySurface {
    pub fn new() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Resize to exactly the native dimensions, clear, and draw every box at
    /// its literal coordinates with a filled ordinal tag in its top-left
    /// corner (one tag block per ordinal, stacked horizontally).
    pub fn render(&mut self, boxes: &[BoundingBox], native_width: u32, native_height: u32) {
        self.image = render_boxes(boxes, native_width, native_height);
    }
}

impl Default for OverlaySurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure renderer used by `OverlaySurface::render`.
pub fn render_boxes(boxes: &[BoundingBox], native_width: u32, native_height: u32) -> RgbaImage {
    let mut image = RgbaImage::new(native_width, native_height);
    if native_width == 0 || native_height == 0 {
        return image;
    }
    for (ordinal, b) in boxes.iter().enumerate() {
        draw_rect_outline(&mut image, b);
        draw_ordinal_tag(&mut image, b, ordinal as u32 + 1);
    }
    image
}

fn clamp_coord(value: f32, max: u32) -> u32 {
    if value <= 0.0 {
        0
    } else {
        (value as u32).min(max.saturating_sub(1))
    }
}

fn draw_rect_outline(image: &mut RgbaImage, b: &BoundingBox) {
    let (w, h) = (image.width(), image.height());
    let x0 = clamp_coord(b.xmin, w);
    let x1 = clamp_coord(b.xmax, w);
    let y0 = clamp_coord(b.ymin, h);
    let y1 = clamp_coord(b.ymax, h);

    for x in x0..=x1 {
        image.put_pixel(x, y0, BOX_COLOR);
        image.put_pixel(x, y1, BOX_COLOR);
    }
    for y in y0..=y1 {
        image.put_pixel(x0, y, BOX_COLOR);
        image.put_pixel(x1, y, BOX_COLOR);
    }
}

/// Filled blocks standing in for the ordinal label: box #n gets n stacked
/// tag blocks along its top edge.
fn draw_ordinal_tag(image: &mut RgbaImage, b: &BoundingBox, ordinal: u32) {
    let (w, h) = (image.width(), image.height());
    let y0 = clamp_coord(b.ymin, h);
    for i in 0..ordinal {
        let x_start = clamp_coord(b.xmin, w).saturating_add(i * (TAG_SIZE + 2));
        for dx in 0..TAG_SIZE {
            for dy in 0..TAG_SIZE {
                let x = x_start + dx;
                let y = y0 + dy;
                if x < w && y < h {
                    image.put_pixel(x, y, BOX_COLOR);
                }
            }
        }
    }
}
