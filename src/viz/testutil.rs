//! Synthetic image fixtures shared across test modules.

use base64::Engine;
use image::{DynamicImage, Rgba, RgbaImage};

/// TIFF tag id for Orientation, duplicated here so fixtures stay
/// self-describing.
const ORIENTATION_TAG: u16 = 0x0112;

/// Build a minimal APP1/EXIF segment holding only the orientation tag, in
/// either byte order. Layout: marker(2) + length(2) + "Exif\0\0"(6) +
/// TIFF header(8) + IFD0 count(2) + one entry(12) + next-IFD(4).
pub fn exif_app1(orientation: u16, le: bool) -> Vec<u8> {
    let u16b = |v: u16| {
        if le {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        }
    };
    let u32b = |v: u32| {
        if le {
            v.to_le_bytes()
        } else {
            v.to_be_bytes()
        }
    };

    let tiff_len: u16 = 8 + 2 + 12 + 4;
    let app1_len: u16 = 2 + 6 + tiff_len;

    let mut buf = Vec::new();
    buf.extend_from_slice(&[0xFF, 0xE1]);
    buf.extend_from_slice(&app1_len.to_be_bytes());
    buf.extend_from_slice(b"Exif\0\0");
    // TIFF header
    buf.extend_from_slice(if le { b"II" } else { b"MM" });
    buf.extend_from_slice(&u16b(42));
    buf.extend_from_slice(&u32b(8)); // IFD0 right after the header
    // IFD0: one entry
    buf.extend_from_slice(&u16b(1));
    buf.extend_from_slice(&u16b(ORIENTATION_TAG));
    buf.extend_from_slice(&u16b(3)); // type SHORT
    buf.extend_from_slice(&u32b(1)); // count
    buf.extend_from_slice(&u16b(orientation));
    buf.extend_from_slice(&[0, 0]); // value slot padding
    buf.extend_from_slice(&u32b(0)); // next IFD
    buf
}

/// A JFIF APP0 segment, for exercising the skip-by-length path.
pub fn jfif_app0() -> Vec<u8> {
    vec![
        0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00, 0x01, 0x00,
        0x01, 0x00, 0x00,
    ]
}

/// A non-EXIF APP1 segment (XMP carries its namespace URL here).
pub fn xmp_app1() -> Vec<u8> {
    let payload = b"http://ns.adobe.com/xap/1.0/\0";
    let len = (2 + payload.len()) as u16;
    let mut buf = vec![0xFF, 0xE1];
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Start-of-image marker followed by the given segments.
pub fn jpeg_with(segments: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = vec![0xFF, 0xD8];
    for s in segments {
        buf.extend_from_slice(s);
    }
    buf
}

/// A real decodable JPEG with the given EXIF orientation tag spliced in
/// right after the start-of-image marker.
pub fn decodable_jpeg_with_orientation(w: u32, h: u32, orientation: u16) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([120, 140, 160, 255])));
    let mut out = std::io::Cursor::new(Vec::new());
    img.to_rgb8()
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("jpeg encode");
    let encoded = out.into_inner();
    let mut buf = Vec::with_capacity(encoded.len() + 40);
    buf.extend_from_slice(&encoded[..2]);
    buf.extend_from_slice(&exif_app1(orientation, true));
    buf.extend_from_slice(&encoded[2..]);
    buf
}

/// A plain decodable PNG (no EXIF, so orientation defaults to upright).
pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([120, 140, 160, 255])));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encode");
    out.into_inner()
}

/// Wrap raw bytes into a base64 data URL.
pub fn data_url(bytes: &[u8], mime: &str) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}
