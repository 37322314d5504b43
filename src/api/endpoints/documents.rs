//! Document upload, listing, and the background processing task.
//!
//! `POST /api/upload` receives the document photo as a base64 data URL,
//! stores a pending record, and kicks off processing: an EXIF orientation
//! scan and a field-extraction call run as independent operations against
//! the record's generation gate, so a reprocess that lands mid-flight
//! simply orphans the older run's results.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config;
use crate::extraction::DocumentKind;
use crate::store::{DocumentRecord, ProcessingJob};
use crate::viz::source::{decode_inline, load_bytes, ImageSource};
use crate::viz::viewer::scan_source;

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    #[serde(default)]
    pub document_type: DocumentKind,
    pub model: Option<String>,
    /// Base64 data URL (or bare base64) of the document photo.
    pub data: String,
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
    pub total: usize,
}

/// `POST /api/upload` — accept a document photo and queue processing.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let bytes = decode_inline(&payload.data)
        .ok_or_else(|| ApiError::BadRequest("Invalid base64 image data".into()))?;
    if bytes.len() > config::MAX_UPLOAD_BYTES {
        return Err(ApiError::BadRequest(format!(
            "File too large. Maximum size is {} bytes",
            config::MAX_UPLOAD_BYTES
        )));
    }
    let Some(mime) = sniff_image_mime(&bytes) else {
        return Err(ApiError::BadRequest(
            "Unsupported image type. Allowed: JPEG, PNG, WebP".into(),
        ));
    };

    // Keep the preview a proper data URL even when the client sent bare
    // base64, so the frontend can drop it straight into an <img>.
    let preview = if payload.data.starts_with("data:") {
        payload.data
    } else {
        format!("data:{mime};base64,{}", payload.data)
    };

    let model = payload
        .model
        .unwrap_or_else(config::extractor_model);
    let record = ctx.store.insert(
        payload.file_name,
        ImageSource::Inline(preview),
        payload.document_type,
        model,
    );

    tracing::info!(
        document_id = %record.id,
        document_type = record.document_type.as_str(),
        size = bytes.len(),
        "document uploaded"
    );

    if let Some(job) = ctx.store.begin_processing(record.id) {
        tokio::spawn(process_document(ctx.clone(), job));
    }
    // Return the freshest view (status has moved to processing).
    let record = ctx
        .store
        .get(record.id)
        .ok_or_else(|| ApiError::Internal("record vanished after insert".into()))?;
    Ok(Json(record))
}

/// `GET /api/documents` — all documents, newest first.
pub async fn list(State(ctx): State<ApiContext>) -> Json<DocumentListResponse> {
    let documents = ctx.store.list();
    let total = documents.len();
    Json(DocumentListResponse { documents, total })
}

/// `GET /api/documents/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentRecord>, ApiError> {
    ctx.store
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Document not found".into()))
}

/// `POST /api/documents/:id/reprocess` — re-run the scan and extraction.
///
/// Bumps the record's generation first, so results from any still-running
/// earlier task are discarded when they eventually land.
pub async fn reprocess(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let job = ctx
        .store
        .begin_processing(id)
        .ok_or_else(|| ApiError::NotFound("Document not found".into()))?;
    tokio::spawn(process_document(ctx.clone(), job));
    ctx.store
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Document not found".into()))
}

/// Background processing for one run: orientation scan and field
/// extraction proceed independently, both gated on the run's ticket.
async fn process_document(ctx: ApiContext, job: ProcessingJob) {
    let ProcessingJob {
        id,
        ticket,
        source,
        document_type,
        model,
        ..
    } = job;

    let orient = async {
        let rotation = scan_source(&ctx.http, &source).await;
        if !ctx.store.apply_rotation(id, ticket, rotation) {
            tracing::debug!(document_id = %id, "orientation result superseded, discarded");
        }
    };

    let extract = async {
        let started = Instant::now();
        let outcome = match load_bytes(&ctx.http, &source).await {
            Some(bytes) => {
                let extractor = ctx.extractor.clone();
                match tokio::task::spawn_blocking(move || {
                    extractor.extract_fields(&bytes, document_type, &model)
                })
                .await
                {
                    Ok(Ok(payload)) => Ok(payload),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(e) => Err(format!("extraction task failed: {e}")),
                }
            }
            None => Err("image source unavailable".to_string()),
        };
        let elapsed = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(payload) => tracing::info!(
                document_id = %id,
                fields = payload.0.len(),
                elapsed_ms = elapsed,
                "document processed"
            ),
            Err(message) => tracing::warn!(
                document_id = %id,
                error = %message,
                "document processing failed"
            ),
        }
        if !ctx.store.complete_processing(id, ticket, outcome, elapsed) {
            tracing::debug!(document_id = %id, "extraction result superseded, discarded");
        }
    };

    tokio::join!(orient, extract);
}

/// Identify the upload by magic bytes; the dashboard only accepts formats
/// the platform decoder can render.
fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        Some("image/jpeg")
    } else if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_jpeg_png_webp() {
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            sniff_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
        assert_eq!(
            sniff_image_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "),
            Some("image/webp")
        );
    }

    #[test]
    fn rejects_unknown_magic() {
        assert_eq!(sniff_image_mime(b"%PDF-1.4"), None);
        assert_eq!(sniff_image_mime(&[]), None);
    }
}
