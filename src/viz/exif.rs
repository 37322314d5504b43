//! JPEG/EXIF/TIFF orientation scanning.
//!
//! Phone cameras usually store the sensor pixels unrotated and record how
//! the device was held in EXIF tag 0x0112 (Orientation). The dashboard
//! needs only that single tag, read before the image is decoded, so this
//! module walks the raw JPEG marker stream by hand instead of pulling in a
//! metadata library: SOI, then marker segments until the APP1/EXIF segment,
//! then the embedded TIFF header and IFD0 entry table.
//!
//! Every read goes through a bounds-checked helper and the whole scan
//! returns `Option`: a non-JPEG buffer, an EXIF-less JPEG, or a truncated
//! or malformed segment all yield `None`, never a panic or an
//! out-of-range read. Callers treat `None` as "display upright".

use serde::{Serialize, Serializer};

/// TIFF tag id for Orientation.
const ORIENTATION_TAG: u16 = 0x0112;

// ───────────────────────────────────────────────
// Bounds-checked primitive reads
// ───────────────────────────────────────────────

fn read_u16(buf: &[u8], at: usize, le: bool) -> Option<u16> {
    let bytes: [u8; 2] = buf.get(at..at + 2)?.try_into().ok()?;
    Some(if le {
        u16::from_le_bytes(bytes)
    } else {
        u16::from_be_bytes(bytes)
    })
}

fn read_u32(buf: &[u8], at: usize, le: bool) -> Option<u32> {
    let bytes: [u8; 4] = buf.get(at..at + 4)?.try_into().ok()?;
    Some(if le {
        u32::from_le_bytes(bytes)
    } else {
        u32::from_be_bytes(bytes)
    })
}

// ───────────────────────────────────────────────
// Marker scan
// ───────────────────────────────────────────────

/// Markers that carry no payload. Hitting one of these before APP1 means
/// the header section is over and no EXIF block exists.
fn is_standalone(marker: u16) -> bool {
    matches!(marker, 0xFF01 | 0xFFD0..=0xFFD9)
}

/// Extract the EXIF orientation tag value from raw JPEG bytes.
///
/// Returns the tag value (1..=8 for well-formed files) or `None` when the
/// buffer is not a JPEG, carries no EXIF block, or is truncated anywhere
/// along the parse path.
pub fn scan_orientation(buf: &[u8]) -> Option<u16> {
    // JPEG start-of-image marker, always big-endian.
    if read_u16(buf, 0, false)? != 0xFFD8 {
        return None;
    }

    let mut pos = 2usize;
    loop {
        let marker = read_u16(buf, pos, false)?;
        if marker & 0xFF00 != 0xFF00 {
            // Not a marker at all; the header stream is corrupt or over.
            return None;
        }
        if marker == 0xFFE1 {
            let len = read_u16(buf, pos + 2, false)? as usize;
            if buf.get(pos + 4..pos + 8) == Some(b"Exif".as_slice()) {
                // Signature (4) + two reserved bytes, then the TIFF header.
                return scan_tiff(buf, pos + 10);
            }
            // APP1 but not EXIF (XMP lives here too); skip the segment.
            pos = pos.checked_add(2 + len)?;
        } else if is_standalone(marker) {
            return None;
        } else {
            let len = read_u16(buf, pos + 2, false)? as usize;
            pos = pos.checked_add(2 + len)?;
        }
    }
}

/// Walk the TIFF header and IFD0 entry table at `tiff`, looking for the
/// orientation tag. IFD offsets are relative to the TIFF header start.
fn scan_tiff(buf: &[u8], tiff: usize) -> Option<u16> {
    let le = match buf.get(tiff..tiff + 2)? {
        b"II" => true,
        b"MM" => false,
        _ => return None,
    };
    let ifd0 = read_u32(buf, tiff + 4, le)? as usize;
    let dir = tiff.checked_add(ifd0)?;
    let entries = read_u16(buf, dir, le)? as usize;
    for i in 0..entries {
        let entry = dir.checked_add(2 + i * 12)?;
        if read_u16(buf, entry, le)? == ORIENTATION_TAG {
            // Single-SHORT entry: the value sits in the first two bytes of
            // the 4-byte value slot at entry offset 8.
            return read_u16(buf, entry + 8, le);
        }
    }
    None
}

// ───────────────────────────────────────────────
// Orientation → display rotation
// ───────────────────────────────────────────────

/// Clockwise rotation needed to display an image upright.
///
/// Derived from the EXIF orientation tag. The mirrored orientations
/// (2, 4, 5, 7) map to the same rotation as their unmirrored
/// counterparts' upright cases; only the pure rotations are distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationDegrees {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl RotationDegrees {
    /// Map an orientation tag value to a display rotation.
    /// Unknown tags and `None` ("tag not found") display unrotated.
    pub fn from_orientation(tag: Option<u16>) -> Self {
        match tag {
            Some(3) => RotationDegrees::R180,
            Some(6) => RotationDegrees::R90,
            Some(8) => RotationDegrees::R270,
            _ => RotationDegrees::R0,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            RotationDegrees::R0 => 0,
            RotationDegrees::R90 => 90,
            RotationDegrees::R180 => 180,
            RotationDegrees::R270 => 270,
        }
    }

    /// Quarter turns swap the displayed width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, RotationDegrees::R90 | RotationDegrees::R270)
    }
}

impl Serialize for RotationDegrees {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.degrees())
    }
}
