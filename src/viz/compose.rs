//! Overlay rendering onto an RGBA surface.
//!
//! Takes the decoded natural image, the display rotation, the viewport and
//! the field boxes, and produces the final surface: the image rotated
//! upright and scaled to fit, each box mapped through the same transform,
//! stroked and lightly filled in its field color, with a small label chip
//! above its top edge. The highlighted box gets a solid, thicker stroke
//! and a stronger fill; all others are dashed and faint.
//!
//! Strokes, glyphs, and chip padding are fixed surface-pixel sizes, so
//! they read the same regardless of how far the image is scaled down.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::exif::RotationDegrees;
use super::layout::{DisplayTransform, SurfaceRect, Viewport};

/// One renderable extracted-field box, in natural (unrotated) pixel space.
#[derive(Debug, Clone)]
pub struct FieldBox {
    /// Stable identifier, unique within a render pass.
    pub field: String,
    /// Human-readable label for the chip and legend.
    pub label: String,
    /// `[x1, y1, x2, y2]` in natural pixels. `x2 > x1`, `y2 > y1` is
    /// assumed, not enforced; degenerate rects draw nothing.
    pub rect: [f32; 4],
    pub color: [u8; 3],
    pub confidence: Option<f32>,
}

impl FieldBox {
    /// Degenerate rects (zero or negative extent) draw nothing and take
    /// no clicks.
    pub fn is_well_formed(&self) -> bool {
        self.rect[2] > self.rect[0] && self.rect[3] > self.rect[1]
    }
}

/// Surface-space hit region of a drawn box, in draw order.
#[derive(Debug, Clone)]
pub struct BoxRegion {
    pub field: String,
    pub rect: SurfaceRect,
}

/// Map the drawable boxes into surface space, in draw order. The same
/// geometry the compositor paints, usable without touching pixels.
pub fn box_regions(boxes: &[FieldBox], transform: &DisplayTransform) -> Vec<BoxRegion> {
    boxes
        .iter()
        .filter(|b| b.is_well_formed())
        .map(|b| BoxRegion {
            field: b.field.clone(),
            rect: transform.map_rect(b.rect),
        })
        .collect()
}

/// Finished render: the surface plus the clickable regions on it.
pub struct RenderedOverlay {
    pub image: RgbaImage,
    pub transform: DisplayTransform,
    pub regions: Vec<BoxRegion>,
}

// ── Style constants ───────────────────────────────

const HIGHLIGHT_STROKE: i32 = 3;
const HIGHLIGHT_FILL_ALPHA: u32 = 70;
const NORMAL_FILL_ALPHA: u32 = 28;
const DASH_LEN: i32 = 4;
const CHIP_ALPHA: u32 = 230;
const CHIP_PAD: i32 = 2;
const CHIP_GAP: i32 = 2;

/// Render the overlay surface.
///
/// The natural image is already decoded by the caller; decode failures are
/// reported upstream as "no image available" and never reach this point.
pub fn compose(
    natural: &DynamicImage,
    rotation: RotationDegrees,
    viewport: Viewport,
    boxes: &[FieldBox],
    highlight: Option<&str>,
) -> RenderedOverlay {
    let (nw, nh) = natural.dimensions();
    let transform = DisplayTransform::fit(nw, nh, rotation, viewport);

    // Rotate exactly (quarter turns are lossless), then scale to fit.
    let rgba = natural.to_rgba8();
    let rotated = match rotation {
        RotationDegrees::R0 => rgba,
        RotationDegrees::R90 => imageops::rotate90(&rgba),
        RotationDegrees::R180 => imageops::rotate180(&rgba),
        RotationDegrees::R270 => imageops::rotate270(&rgba),
    };
    let mut surface = imageops::resize(
        &rotated,
        transform.display_width.max(1),
        transform.display_height.max(1),
        FilterType::CatmullRom,
    );

    let regions = box_regions(boxes, &transform);
    for b in boxes.iter().filter(|b| b.is_well_formed()) {
        let rect = transform.map_rect(b.rect);
        let is_highlighted = highlight == Some(b.field.as_str());
        draw_box(&mut surface, &rect, b, is_highlighted);
    }

    RenderedOverlay {
        image: surface,
        transform,
        regions,
    }
}

/// Encode a rendered surface as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

// ───────────────────────────────────────────────
// Box drawing
// ───────────────────────────────────────────────

fn draw_box(surface: &mut RgbaImage, rect: &SurfaceRect, b: &FieldBox, highlighted: bool) {
    let x = rect.x.round() as i32;
    let y = rect.y.round() as i32;
    let w = rect.w.round() as i32;
    let h = rect.h.round() as i32;
    if w < 1 || h < 1 {
        return;
    }

    let fill_alpha = if highlighted {
        HIGHLIGHT_FILL_ALPHA
    } else {
        NORMAL_FILL_ALPHA
    };
    fill_rect_blend(surface, x, y, w, h, b.color, fill_alpha);

    let stroke = Rgba([b.color[0], b.color[1], b.color[2], 255]);
    if highlighted {
        // Solid stroke, thickened by nesting hollow rects inward.
        for t in 0..HIGHLIGHT_STROKE {
            let (iw, ih) = (w - 2 * t, h - 2 * t);
            if iw < 1 || ih < 1 {
                break;
            }
            draw_hollow_rect_mut(
                surface,
                Rect::at(x + t, y + t).of_size(iw as u32, ih as u32),
                stroke,
            );
        }
    } else {
        draw_dashed_rect(surface, x, y, w, h, stroke);
    }

    draw_label_chip(surface, x, y, b);
}

/// 1px dashed rectangle outline, `DASH_LEN` on / `DASH_LEN` off.
fn draw_dashed_rect(surface: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgba<u8>) {
    for dx in 0..w {
        if (dx / DASH_LEN) % 2 == 0 {
            put_px(surface, x + dx, y, color);
            put_px(surface, x + dx, y + h - 1, color);
        }
    }
    for dy in 0..h {
        if (dy / DASH_LEN) % 2 == 0 {
            put_px(surface, x, y + dy, color);
            put_px(surface, x + w - 1, y + dy, color);
        }
    }
}

/// Colored chip with the field label (and confidence, when known) sitting
/// just above the box's top edge. Chips near the surface top may extend
/// off the drawable area; off-surface pixels are simply not written.
fn draw_label_chip(surface: &mut RgbaImage, x: i32, y: i32, b: &FieldBox) {
    let text = match b.confidence {
        Some(c) => format!("{} {:.0}%", b.label, (c * 100.0).clamp(0.0, 100.0)),
        None => b.label.clone(),
    };
    let chip_h = GLYPH_H + 2 * CHIP_PAD;
    let chip_w = text_width(&text) + 2 * CHIP_PAD;
    let chip_y = y - chip_h - CHIP_GAP;

    fill_rect_blend(surface, x, chip_y, chip_w, chip_h, b.color, CHIP_ALPHA);
    draw_text(
        surface,
        &text,
        x + CHIP_PAD,
        chip_y + CHIP_PAD,
        Rgba([255, 255, 255, 255]),
    );
}

// ───────────────────────────────────────────────
// Pixel primitives
// ───────────────────────────────────────────────

fn put_px(surface: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < surface.width() && (y as u32) < surface.height() {
        surface.put_pixel(x as u32, y as u32, color);
    }
}

/// Alpha-blend a solid color over a rectangle, skipping off-surface rows
/// and columns.
fn fill_rect_blend(surface: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, rgb: [u8; 3], alpha: u32) {
    for dy in 0..h {
        let py = y + dy;
        if py < 0 || py as u32 >= surface.height() {
            continue;
        }
        for dx in 0..w {
            let px = x + dx;
            if px < 0 || px as u32 >= surface.width() {
                continue;
            }
            let dst = surface.get_pixel(px as u32, py as u32).0;
            let blend = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * (255 - alpha)) / 255) as u8;
            surface.put_pixel(
                px as u32,
                py as u32,
                Rgba([
                    blend(rgb[0], dst[0]),
                    blend(rgb[1], dst[1]),
                    blend(rgb[2], dst[2]),
                    255,
                ]),
            );
        }
    }
}

// ───────────────────────────────────────────────
// 5x7 bitmap text
// ───────────────────────────────────────────────

const GLYPH_W: i32 = 5;
const GLYPH_H: i32 = 7;
/// Glyph advance: five columns plus one of spacing.
const GLYPH_ADV: i32 = GLYPH_W + 1;

fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADV - 1
}

fn draw_text(surface: &mut RgbaImage, text: &str, x: i32, y: i32, color: Rgba<u8>) {
    let mut cx = x;
    for ch in text.chars() {
        draw_glyph(surface, ch, cx, y, color);
        cx += GLYPH_ADV;
    }
}

fn draw_glyph(surface: &mut RgbaImage, ch: char, x: i32, y: i32, color: Rgba<u8>) {
    let idx = (ch as u32).wrapping_sub(32) as usize;
    if idx >= FONT_5X7.len() {
        return;
    }
    let glyph = &FONT_5X7[idx];
    for (col, bits) in glyph.iter().enumerate() {
        for row in 0..GLYPH_H {
            if bits & (1 << row) != 0 {
                put_px(surface, x + col as i32, y + row, color);
            }
        }
    }
}

/// 5x7 bitmap font covering ASCII 32..127, one byte per column, LSB at
/// the top row.
#[rustfmt::skip]
const FONT_5X7: [[u8; 5]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x14, 0x08, 0x3E, 0x08, 0x14], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x3E, 0x41, 0x5D, 0x55, 0x1E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x07, 0x08, 0x70, 0x08, 0x07], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x7F, 0x10, 0x28, 0x44, 0x00], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x10, 0x08, 0x08, 0x10, 0x08], // ~
    [0x00, 0x00, 0x00, 0x00, 0x00], // DEL
];

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
    const RED: [u8; 3] = [255, 0, 0];

    fn gray_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, GRAY))
    }

    fn vp(w: u32, h: u32) -> Viewport {
        Viewport {
            container_width: w,
            max_height: h,
        }
    }

    fn red_box(rect: [f32; 4]) -> FieldBox {
        FieldBox {
            field: "full_name".into(),
            label: "Full Name".into(),
            rect,
            color: RED,
            confidence: Some(0.87),
        }
    }

    #[test]
    fn surface_matches_fitted_dimensions() {
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &[],
            None,
        );
        assert_eq!(out.image.dimensions(), (100, 80));
    }

    #[test]
    fn quarter_turn_swaps_surface_dimensions() {
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R90,
            vp(80, 1000),
            &[],
            None,
        );
        assert_eq!(out.image.dimensions(), (80, 100));
    }

    #[test]
    fn highlighted_box_strokes_solid_corner() {
        let boxes = [red_box([10.0, 30.0, 30.0, 40.0])];
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &boxes,
            Some("full_name"),
        );
        // Solid stroke paints every edge pixel, corners included.
        assert_eq!(*out.image.get_pixel(10, 30), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.image.get_pixel(15, 30), Rgba([255, 0, 0, 255]));
        // Thickness 3: one row inside the edge is still stroke.
        assert_eq!(*out.image.get_pixel(15, 31), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn unhighlighted_box_strokes_dashed() {
        let boxes = [red_box([10.0, 30.0, 30.0, 40.0])];
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &boxes,
            None,
        );
        // Dash pattern starts "on" at the corner, gaps after DASH_LEN px.
        assert_eq!(*out.image.get_pixel(10, 30), Rgba([255, 0, 0, 255]));
        assert_ne!(*out.image.get_pixel(15, 30), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn fill_tints_the_interior() {
        let boxes = [red_box([10.0, 30.0, 30.0, 40.0])];
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &boxes,
            None,
        );
        let interior = out.image.get_pixel(20, 35);
        assert!(interior.0[0] > GRAY.0[0], "red channel lifted by fill");
        assert!(interior.0[0] < 255, "fill is translucent, not solid");
    }

    #[test]
    fn label_chip_sits_above_the_box() {
        let boxes = [red_box([10.0, 30.0, 30.0, 40.0])];
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &boxes,
            None,
        );
        // Chip occupies rows just above y=30; well above it stays gray.
        assert_ne!(*out.image.get_pixel(12, 25), GRAY);
        assert_eq!(*out.image.get_pixel(12, 10), GRAY);
    }

    #[test]
    fn chip_near_top_edge_draws_without_panicking() {
        let boxes = [red_box([10.0, 2.0, 30.0, 12.0])];
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &boxes,
            None,
        );
        // Rows above the surface are skipped; the box itself still drew.
        assert_eq!(*out.image.get_pixel(10, 2), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn malformed_rect_renders_nothing_and_is_not_clickable() {
        let boxes = [red_box([30.0, 40.0, 10.0, 30.0])];
        let out = compose(
            &gray_image(100, 80),
            RotationDegrees::R0,
            vp(100, 1000),
            &boxes,
            None,
        );
        assert!(out.regions.is_empty());
        assert_eq!(*out.image.get_pixel(20, 35), GRAY);
    }

    #[test]
    fn regions_follow_the_display_transform() {
        let boxes = [red_box([100.0, 100.0, 300.0, 150.0])];
        let out = compose(
            &gray_image(1000, 800),
            RotationDegrees::R0,
            vp(1000, 10_000),
            &boxes,
            None,
        );
        let r = &out.regions[0].rect;
        assert!((r.x - 100.0).abs() < 1e-3);
        assert!((r.y - 100.0).abs() < 1e-3);
        assert!((r.w - 200.0).abs() < 1e-3);
        assert!((r.h - 50.0).abs() < 1e-3);
    }

    #[test]
    fn boxes_rotate_with_the_image() {
        // Under a quarter turn the box region must land in rotated space.
        let boxes = [red_box([0.0, 0.0, 100.0, 50.0])];
        let out = compose(
            &gray_image(100, 200),
            RotationDegrees::R90,
            vp(200, 1000),
            &boxes,
            None,
        );
        // Natural top-left strip maps to the surface's right edge.
        let r = &out.regions[0].rect;
        assert!((r.x - 150.0).abs() < 1e-3);
        assert!((r.y - 0.0).abs() < 1e-3);
        assert!((r.w - 50.0).abs() < 1e-3);
        assert!((r.h - 100.0).abs() < 1e-3);
    }

    #[test]
    fn png_encoding_produces_png_magic() {
        let out = compose(
            &gray_image(20, 20),
            RotationDegrees::R0,
            vp(20, 20),
            &[],
            None,
        );
        let png = encode_png(&out.image).unwrap();
        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn text_width_counts_glyph_advances() {
        assert_eq!(text_width("AB"), 11);
        assert_eq!(text_width(""), -1); // empty labels never reach drawing
    }
}
