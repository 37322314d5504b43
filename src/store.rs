//! In-memory document store.
//!
//! Documents live in process memory for the lifetime of the service, the
//! same contract the dashboard backend has always had; persistence is a
//! separate concern owned elsewhere. Each record carries its own
//! orientation tracker so scan and extraction completions from a
//! superseded processing run are discarded instead of clobbering newer
//! state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::extraction::{DocumentKind, FieldPayload};
use crate::viz::{HighlightState, ImageSource, OrientationTracker, RotationDegrees, SourceTicket};

/// Processing lifecycle of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// One uploaded document and everything the dashboard shows about it.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FieldPayload>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub source_file: Option<String>,
    /// Inline preview the dashboard renders from; also the scan source.
    pub image_preview: Option<ImageSource>,
    pub document_type: DocumentKind,
    pub model_used: String,
    pub inference_time_ms: Option<u64>,
    /// Display rotation determined from the EXIF scan.
    pub rotation: RotationDegrees,
    /// Currently highlighted field, if any.
    pub highlight: HighlightState,
}

struct DocumentEntry {
    record: DocumentRecord,
    tracker: Arc<OrientationTracker>,
}

/// Everything a processing run needs, captured at start so the task never
/// holds the store lock.
pub struct ProcessingJob {
    pub id: Uuid,
    pub ticket: SourceTicket,
    pub source: ImageSource,
    pub document_type: DocumentKind,
    pub model: String,
}

#[derive(Default)]
pub struct DocumentStore {
    inner: RwLock<HashMap<Uuid, DocumentEntry>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending record for a fresh upload.
    pub fn insert(
        &self,
        source_file: Option<String>,
        image: ImageSource,
        document_type: DocumentKind,
        model: String,
    ) -> DocumentRecord {
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            status: ProcessingStatus::Pending,
            data: None,
            error: None,
            created_at: Utc::now(),
            processed_at: None,
            source_file,
            image_preview: Some(image),
            document_type,
            model_used: model,
            inference_time_ms: None,
            rotation: RotationDegrees::R0,
            highlight: HighlightState::new(),
        };
        let entry = DocumentEntry {
            record: record.clone(),
            tracker: Arc::new(OrientationTracker::new()),
        };
        self.write().insert(record.id, entry);
        record
    }

    pub fn get(&self, id: Uuid) -> Option<DocumentRecord> {
        self.read().get(&id).map(|e| e.record.clone())
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<DocumentRecord> {
        let mut records: Vec<DocumentRecord> =
            self.read().values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Start (or restart) processing a document. Bumps the generation so
    /// any still-running older tasks become stale, resets the visible
    /// results, and hands back what the new task needs.
    pub fn begin_processing(&self, id: Uuid) -> Option<ProcessingJob> {
        let mut guard = self.write();
        let entry = guard.get_mut(&id)?;
        let ticket = entry.tracker.begin_source();
        entry.record.status = ProcessingStatus::Processing;
        entry.record.data = None;
        entry.record.error = None;
        entry.record.processed_at = None;
        entry.record.inference_time_ms = None;
        entry.record.rotation = RotationDegrees::R0;
        let source = entry.record.image_preview.clone()?;
        Some(ProcessingJob {
            id,
            ticket,
            source,
            document_type: entry.record.document_type,
            model: entry.record.model_used.clone(),
        })
    }

    /// Record the scanned rotation; ignored when the run is stale.
    pub fn apply_rotation(
        &self,
        id: Uuid,
        ticket: SourceTicket,
        rotation: RotationDegrees,
    ) -> bool {
        let mut guard = self.write();
        let Some(entry) = guard.get_mut(&id) else {
            return false;
        };
        if !entry.tracker.apply(ticket, rotation) {
            return false;
        }
        entry.record.rotation = rotation;
        true
    }

    /// Record the extraction outcome; ignored when the run is stale.
    pub fn complete_processing(
        &self,
        id: Uuid,
        ticket: SourceTicket,
        outcome: Result<FieldPayload, String>,
        inference_time_ms: u64,
    ) -> bool {
        let mut guard = self.write();
        let Some(entry) = guard.get_mut(&id) else {
            return false;
        };
        if !entry.tracker.is_current(ticket) {
            return false;
        }
        match outcome {
            Ok(payload) => {
                entry.record.status = ProcessingStatus::Completed;
                entry.record.data = Some(payload);
                entry.record.error = None;
            }
            Err(message) => {
                entry.record.status = ProcessingStatus::Error;
                entry.record.error = Some(message);
            }
        }
        entry.record.processed_at = Some(Utc::now());
        entry.record.inference_time_ms = Some(inference_time_ms);
        true
    }

    /// Toggle the highlighted field on a record; returns the new
    /// selection, or `None` for an unknown document.
    pub fn toggle_highlight(&self, id: Uuid, field: &str) -> Option<Option<String>> {
        let mut guard = self.write();
        let entry = guard.get_mut(&id)?;
        let current = entry.record.highlight.toggle(field).map(str::to_string);
        Some(current)
    }

    /// Clear the highlight (clicking empty surface deselects).
    pub fn clear_highlight(&self, id: Uuid) -> Option<()> {
        let mut guard = self.write();
        let entry = guard.get_mut(&id)?;
        entry.record.highlight.clear();
        Some(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, DocumentEntry>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, DocumentEntry>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::FieldObservation;

    fn store_with_doc() -> (DocumentStore, Uuid) {
        let store = DocumentStore::new();
        let record = store.insert(
            Some("passport.jpg".into()),
            ImageSource::Inline("data:image/jpeg;base64,AAAA".into()),
            DocumentKind::Passport,
            "test-model".into(),
        );
        let id = record.id;
        (store, id)
    }

    fn payload() -> FieldPayload {
        let mut p = FieldPayload::default();
        p.insert(
            "full_name",
            FieldObservation::new("JANE DOE").with_rect([1.0, 2.0, 3.0, 4.0]),
        );
        p
    }

    #[test]
    fn insert_creates_pending_record() {
        let (store, id) = store_with_doc();
        let record = store.get(id).unwrap();
        assert_eq!(record.status, ProcessingStatus::Pending);
        assert!(record.data.is_none());
        assert_eq!(record.rotation, RotationDegrees::R0);
    }

    #[test]
    fn unknown_id_returns_none() {
        let store = DocumentStore::new();
        assert!(store.get(Uuid::new_v4()).is_none());
        assert!(store.begin_processing(Uuid::new_v4()).is_none());
    }

    #[test]
    fn list_is_newest_first() {
        let store = DocumentStore::new();
        let a = store.insert(
            Some("a.jpg".into()),
            ImageSource::Inline("AAAA".into()),
            DocumentKind::Auto,
            "m".into(),
        );
        let b = store.insert(
            Some("b.jpg".into()),
            ImageSource::Inline("BBBB".into()),
            DocumentKind::Auto,
            "m".into(),
        );
        let listed = store.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, b.id);
        assert_eq!(listed[1].id, a.id);
    }

    #[test]
    fn processing_run_applies_results() {
        let (store, id) = store_with_doc();
        let job = store.begin_processing(id).unwrap();
        assert_eq!(store.get(id).unwrap().status, ProcessingStatus::Processing);

        assert!(store.apply_rotation(id, job.ticket, RotationDegrees::R90));
        assert!(store.complete_processing(id, job.ticket, Ok(payload()), 42));

        let record = store.get(id).unwrap();
        assert_eq!(record.status, ProcessingStatus::Completed);
        assert_eq!(record.rotation, RotationDegrees::R90);
        assert_eq!(record.inference_time_ms, Some(42));
        assert!(record.processed_at.is_some());
    }

    #[test]
    fn superseded_run_results_are_discarded() {
        let (store, id) = store_with_doc();
        let first = store.begin_processing(id).unwrap();
        let second = store.begin_processing(id).unwrap();

        // The newer run resolves first.
        assert!(store.apply_rotation(id, second.ticket, RotationDegrees::R180));
        assert!(store.complete_processing(id, second.ticket, Ok(payload()), 10));

        // The stale run's completions land afterwards and change nothing.
        assert!(!store.apply_rotation(id, first.ticket, RotationDegrees::R90));
        assert!(!store.complete_processing(
            id,
            first.ticket,
            Err("stale failure".into()),
            99
        ));

        let record = store.get(id).unwrap();
        assert_eq!(record.rotation, RotationDegrees::R180);
        assert_eq!(record.status, ProcessingStatus::Completed);
        assert_eq!(record.inference_time_ms, Some(10));
    }

    #[test]
    fn extraction_failure_marks_error_status() {
        let (store, id) = store_with_doc();
        let job = store.begin_processing(id).unwrap();
        assert!(store.complete_processing(id, job.ticket, Err("service down".into()), 5));

        let record = store.get(id).unwrap();
        assert_eq!(record.status, ProcessingStatus::Error);
        assert_eq!(record.error.as_deref(), Some("service down"));
        assert!(record.data.is_none());
    }

    #[test]
    fn reprocessing_resets_visible_results() {
        let (store, id) = store_with_doc();
        let job = store.begin_processing(id).unwrap();
        store.apply_rotation(id, job.ticket, RotationDegrees::R90);
        store.complete_processing(id, job.ticket, Ok(payload()), 7);

        let _again = store.begin_processing(id).unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.status, ProcessingStatus::Processing);
        assert!(record.data.is_none());
        assert_eq!(record.rotation, RotationDegrees::R0);
        assert!(record.inference_time_ms.is_none());
    }

    #[test]
    fn highlight_toggles_through_the_store() {
        let (store, id) = store_with_doc();
        assert_eq!(
            store.toggle_highlight(id, "full_name"),
            Some(Some("full_name".to_string()))
        );
        assert_eq!(store.toggle_highlight(id, "full_name"), Some(None));
        assert!(store.toggle_highlight(Uuid::new_v4(), "x").is_none());
    }
}
