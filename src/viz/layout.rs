//! Display-fit and coordinate-mapping math for the overlay surface.
//!
//! Field bounding boxes arrive in natural space, the pixel grid of the
//! unrotated source image. The surface shows the image rotated upright and
//! scaled to the viewport, so every box corner has to travel through the
//! same transform as the pixels: center the natural frame, rotate
//! clockwise, scale, then re-center on the surface. Keeping this as pure
//! functions makes the whole mapping testable without touching a single
//! pixel.

use super::exif::RotationDegrees;

/// Host-supplied display constraints.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub container_width: u32,
    pub max_height: u32,
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl SurfaceRect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// Per-render mapping from natural space to the display surface.
///
/// Derived from the natural image size, the display rotation, and the
/// viewport; recomputed whenever any of those change.
#[derive(Debug, Clone, Copy)]
pub struct DisplayTransform {
    pub display_width: u32,
    pub display_height: u32,
    pub scale: f32,
    rotation: RotationDegrees,
    natural_w: f32,
    natural_h: f32,
}

impl DisplayTransform {
    /// Fit the rotated bounding box of a `natural_w` x `natural_h` image
    /// into the viewport, preserving aspect ratio.
    ///
    /// Width-fits first; if the resulting height exceeds `max_height` the
    /// fit is recomputed height-first. The scale factor relates rotated
    /// (not natural) width to display width.
    pub fn fit(
        natural_w: u32,
        natural_h: u32,
        rotation: RotationDegrees,
        viewport: Viewport,
    ) -> Self {
        let (nw, nh) = (natural_w.max(1) as f32, natural_h.max(1) as f32);
        let (rw, rh) = if rotation.swaps_axes() {
            (nh, nw)
        } else {
            (nw, nh)
        };

        let mut display_width = viewport.container_width.max(1) as f32;
        let mut display_height = display_width * rh / rw;
        let max_height = viewport.max_height.max(1) as f32;
        if display_height > max_height {
            display_height = max_height;
            display_width = display_height * rw / rh;
        }

        Self {
            display_width: display_width.round() as u32,
            display_height: display_height.round() as u32,
            scale: display_width / rw,
            rotation,
            natural_w: nw,
            natural_h: nh,
        }
    }

    /// Map a natural-space point onto the surface.
    ///
    /// Center the natural frame on the origin, rotate clockwise, scale,
    /// then translate to the surface center. This is the same pivot the
    /// image pixels go through, so mapped boxes track the rotation
    /// exactly regardless of aspect ratio.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let cx = x - self.natural_w / 2.0;
        let cy = y - self.natural_h / 2.0;
        let (rx, ry) = match self.rotation {
            RotationDegrees::R0 => (cx, cy),
            RotationDegrees::R90 => (-cy, cx),
            RotationDegrees::R180 => (-cx, -cy),
            RotationDegrees::R270 => (cy, -cx),
        };
        (
            rx * self.scale + self.display_width as f32 / 2.0,
            ry * self.scale + self.display_height as f32 / 2.0,
        )
    }

    /// Map a natural-space `[x1, y1, x2, y2]` rect onto the surface.
    ///
    /// Corners are mapped independently and re-normalized to min/max, so
    /// rects stay axis-aligned under every quarter turn (a 90-degree turn
    /// flips the corner ordering).
    pub fn map_rect(&self, rect: [f32; 4]) -> SurfaceRect {
        let (ax, ay) = self.map_point(rect[0], rect[1]);
        let (bx, by) = self.map_point(rect[2], rect[3]);
        SurfaceRect {
            x: ax.min(bx),
            y: ay.min(by),
            w: (bx - ax).abs(),
            h: (by - ay).abs(),
        }
    }
}
