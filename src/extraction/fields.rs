//! Extracted-field payload and the identity-field catalog.
//!
//! The extraction service reports a mapping from known field names to
//! observations: the recognized value, an optional bounding box in natural
//! pixels, and an optional confidence. The catalog fixes which fields can
//! carry a box, their display labels, and their overlay colors; render
//! order is catalog order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::viz::FieldBox;

/// One field as reported by the extraction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldObservation {
    pub value: String,
    /// `[x1, y1, x2, y2]` in natural (unrotated) pixels. Anything that is
    /// not exactly four numbers is excluded from rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl FieldObservation {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            rect: None,
            confidence: None,
        }
    }

    pub fn with_rect(mut self, rect: [f32; 4]) -> Self {
        self.rect = Some(rect.to_vec());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Field-name-to-observation mapping for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPayload(pub HashMap<String, FieldObservation>);

/// Boxable identity fields: name, display label, overlay color.
///
/// Matches the schema the extraction service is asked to fill. Fields the
/// service reports outside this catalog (document type, raw text) never
/// carry boxes and are ignored by the overlay.
pub const FIELD_CATALOG: [(&str, &str, [u8; 3]); 7] = [
    ("full_name", "Full Name", [231, 76, 60]),
    ("date_of_birth", "Date of Birth", [46, 204, 113]),
    ("document_number", "Document Number", [52, 152, 219]),
    ("expiry_date", "Expiry Date", [155, 89, 182]),
    ("issue_date", "Issue Date", [241, 196, 15]),
    ("nationality", "Nationality", [230, 126, 34]),
    ("address", "Address", [26, 188, 156]),
];

impl FieldPayload {
    pub fn insert(&mut self, name: impl Into<String>, observation: FieldObservation) {
        self.0.insert(name.into(), observation);
    }

    pub fn get(&self, name: &str) -> Option<&FieldObservation> {
        self.0.get(name)
    }

    /// Build the renderable box collection, fresh per payload change.
    ///
    /// Catalog order; observations without a box, or whose `rect` is not
    /// exactly four numbers, are silently excluded.
    pub fn field_boxes(&self) -> Vec<FieldBox> {
        let mut boxes = Vec::new();
        for (name, label, color) in FIELD_CATALOG {
            let Some(observation) = self.0.get(name) else {
                continue;
            };
            let Some(rect) = observation.rect.as_deref() else {
                continue;
            };
            let &[x1, y1, x2, y2] = rect else {
                continue;
            };
            boxes.push(FieldBox {
                field: name.to_string(),
                label: label.to_string(),
                rect: [x1, y1, x2, y2],
                color,
                confidence: observation.confidence,
            });
        }
        boxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FieldPayload {
        let mut payload = FieldPayload::default();
        payload.insert(
            "date_of_birth",
            FieldObservation::new("1990-04-12")
                .with_rect([120.0, 300.0, 360.0, 340.0])
                .with_confidence(0.92),
        );
        payload.insert(
            "full_name",
            FieldObservation::new("JANE DOE")
                .with_rect([120.0, 200.0, 480.0, 250.0])
                .with_confidence(0.97),
        );
        payload.insert("document_type", FieldObservation::new("passport"));
        payload
    }

    #[test]
    fn boxes_follow_catalog_order() {
        let boxes = sample().field_boxes();
        let fields: Vec<&str> = boxes.iter().map(|b| b.field.as_str()).collect();
        assert_eq!(fields, ["full_name", "date_of_birth"]);
    }

    #[test]
    fn observation_without_rect_is_not_boxed() {
        let boxes = sample().field_boxes();
        assert!(boxes.iter().all(|b| b.field != "document_type"));
    }

    #[test]
    fn rect_of_wrong_arity_is_excluded() {
        let mut payload = sample();
        payload.insert(
            "nationality",
            FieldObservation {
                value: "UTOPIAN".into(),
                rect: Some(vec![10.0, 20.0, 30.0]),
                confidence: Some(0.8),
            },
        );
        let boxes = payload.field_boxes();
        assert!(boxes.iter().all(|b| b.field != "nationality"));
    }

    #[test]
    fn unknown_field_names_are_ignored() {
        let mut payload = sample();
        payload.insert(
            "shoe_size",
            FieldObservation::new("42").with_rect([0.0, 0.0, 10.0, 10.0]),
        );
        assert_eq!(payload.field_boxes().len(), 2);
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = sample();
        let json = serde_json::to_string(&payload).unwrap();
        let back: FieldPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn payload_parses_service_shaped_json() {
        let json = r#"{
            "full_name": {"value": "JOHN Q PUBLIC", "rect": [10, 20, 200, 60], "confidence": 0.95},
            "document_type": {"value": "driver_license"}
        }"#;
        let payload: FieldPayload = serde_json::from_str(json).unwrap();
        let boxes = payload.field_boxes();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].rect, [10.0, 20.0, 200.0, 60.0]);
    }

    #[test]
    fn catalog_colors_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for (_, _, color) in FIELD_CATALOG {
            assert!(seen.insert(color), "duplicate overlay color {color:?}");
        }
    }
}
