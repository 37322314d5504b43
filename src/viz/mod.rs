//! Document-photo visualization engine.
//!
//! Everything needed to show an identity-document photo the way the camera
//! saw it, with extracted-field overlays landing in the right place:
//!
//! - [`source`]: resolve an image source (URL or inline base64) to bytes
//! - [`exif`]: hand-rolled JPEG/EXIF/TIFF orientation scan and the
//!   orientation-to-rotation table
//! - [`layout`]: viewport fitting and natural-to-surface coordinate math
//! - [`compose`]: raster rendering of the rotated image plus field boxes
//! - [`interact`]: highlight state, hit testing, and the legend
//! - [`viewer`]: generation-gated application of asynchronous scan results

pub mod compose;
pub mod exif;
pub mod interact;
pub mod layout;
pub mod source;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testutil;

pub use compose::{box_regions, compose, encode_png, BoxRegion, FieldBox, RenderedOverlay};
pub use exif::{scan_orientation, RotationDegrees};
pub use interact::{hit_test, legend, HighlightState, LegendEntry};
pub use layout::{DisplayTransform, SurfaceRect, Viewport};
pub use source::{load_bytes, ImageSource};
pub use viewer::{refresh_orientation, scan_source, OrientationTracker, SourceTicket};
