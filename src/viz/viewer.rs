//! Asynchronous orientation tracking with stale-result discarding.
//!
//! Orientation scanning is fire-and-forget: when the displayed source
//! changes, a task fetches the bytes and scans for the EXIF tag while the
//! rest of the pipeline keeps going. If the source changes again before
//! the first task resolves, the first result must never be applied.
//! A monotonically increasing generation counter gates every completion:
//! tasks capture a ticket when they start and results are accepted only
//! while that ticket is still current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use super::exif::{scan_orientation, RotationDegrees};
use super::source::{load_bytes, ImageSource};

/// Proof of which source generation a task was started for.
#[derive(Debug, Clone, Copy)]
pub struct SourceTicket(u64);

/// Current display rotation for a single viewed image, safe to share with
/// in-flight scan tasks.
#[derive(Debug, Default)]
pub struct OrientationTracker {
    generation: AtomicU64,
    rotation: RwLock<RotationDegrees>,
}

impl OrientationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new current source. The rotation resets to upright until
    /// the new source's scan lands, and every ticket issued earlier becomes
    /// stale.
    pub fn begin_source(&self) -> SourceTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self
            .rotation
            .write()
            .unwrap_or_else(PoisonError::into_inner) = RotationDegrees::R0;
        SourceTicket(generation)
    }

    /// Apply a finished scan's rotation. Returns `false` without touching
    /// state when the ticket is stale (the source changed mid-flight).
    pub fn apply(&self, ticket: SourceTicket, rotation: RotationDegrees) -> bool {
        let mut slot = self
            .rotation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            return false;
        }
        *slot = rotation;
        true
    }

    /// Whether a ticket still refers to the current source. Lets other
    /// per-source work (extraction, for one) share the same gate.
    pub fn is_current(&self, ticket: SourceTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    pub fn rotation(&self) -> RotationDegrees {
        *self.rotation.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Load a source's bytes and determine its display rotation.
///
/// The raw buffer lives only for the duration of the scan. An unreadable
/// source degrades to upright display.
pub async fn scan_source(http: &reqwest::Client, source: &ImageSource) -> RotationDegrees {
    match load_bytes(http, source).await {
        Some(buffer) => {
            let tag = scan_orientation(&buffer);
            tracing::debug!(?tag, bytes = buffer.len(), "orientation scan complete");
            RotationDegrees::from_orientation(tag)
        }
        None => RotationDegrees::R0,
    }
}

/// Full scan cycle for a newly current source: take a ticket, scan, and
/// apply the result if nothing replaced the source meanwhile.
pub async fn refresh_orientation(
    tracker: &OrientationTracker,
    http: &reqwest::Client,
    source: &ImageSource,
) -> bool {
    let ticket = tracker.begin_source();
    let rotation = scan_source(http, source).await;
    tracker.apply(ticket, rotation)
}
