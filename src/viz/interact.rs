//! Highlight state, hit testing, and the clickable legend.
//!
//! The interaction layer owns exactly one piece of state: which field, if
//! any, is highlighted. Everything else is a projection of the rendered
//! regions produced by the compositor.

use serde::Serialize;

use super::compose::{BoxRegion, FieldBox};

/// At most one highlighted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HighlightState(Option<String>);

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Toggle a field: selecting the active field clears the selection.
    /// Returns the new selection, which callers report to the host.
    pub fn toggle(&mut self, field: &str) -> Option<&str> {
        if self.0.as_deref() == Some(field) {
            self.0 = None;
        } else {
            self.0 = Some(field.to_string());
        }
        self.current()
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Resolve a surface click to the field of the topmost box under it.
/// Regions are in draw order, so the last match wins.
pub fn hit_test(regions: &[BoxRegion], x: f32, y: f32) -> Option<&str> {
    regions
        .iter()
        .rev()
        .find(|r| r.rect.contains(x, y))
        .map(|r| r.field.as_str())
}

/// One clickable legend row for a rendered box.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub field: String,
    pub label: String,
    pub color: String,
    pub confidence: Option<f32>,
}

/// Build legend rows in render order.
pub fn legend(boxes: &[FieldBox]) -> Vec<LegendEntry> {
    boxes
        .iter()
        .map(|b| LegendEntry {
            field: b.field.clone(),
            label: b.label.clone(),
            color: format!("#{:02x}{:02x}{:02x}", b.color[0], b.color[1], b.color[2]),
            confidence: b.confidence,
        })
        .collect()
}
