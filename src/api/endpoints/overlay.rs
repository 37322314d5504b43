//! Overlay rendering, legend, and click handling.
//!
//! These endpoints expose the visualization engine: the overlay route
//! returns the composited PNG, the legend route returns the clickable
//! entries plus each box's surface region, and the click/highlight routes
//! drive the single-selection highlight state.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::store::DocumentRecord;
use crate::viz::{
    box_regions, compose, encode_png, hit_test, legend, BoxRegion, DisplayTransform, FieldBox,
    LegendEntry, Viewport,
};
use crate::viz::source::load_bytes;

/// Default viewport when the frontend does not say otherwise.
const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_MAX_HEIGHT: u32 = 1000;

#[derive(Deserialize)]
pub struct ViewportParams {
    pub width: Option<u32>,
    pub max_height: Option<u32>,
    /// Overrides the stored highlight for this render only.
    pub highlight: Option<String>,
}

impl ViewportParams {
    fn viewport(&self) -> Viewport {
        Viewport {
            container_width: self.width.unwrap_or(DEFAULT_WIDTH),
            max_height: self.max_height.unwrap_or(DEFAULT_MAX_HEIGHT),
        }
    }
}

/// `GET /api/documents/:id/overlay` — composited PNG of the document with
/// its field boxes.
pub async fn render(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewportParams>,
) -> Result<Response, ApiError> {
    let record = fetch(&ctx, id)?;
    let bytes = source_bytes(&ctx, &record).await?;
    let natural = image::load_from_memory(&bytes).map_err(|e| {
        tracing::warn!(document_id = %id, error = %e, "image decode failed");
        ApiError::NoImage
    })?;

    let boxes = record_boxes(&record);
    let highlight = params
        .highlight
        .clone()
        .or_else(|| record.highlight.current().map(str::to_string));
    let overlay = compose(
        &natural,
        record.rotation,
        params.viewport(),
        &boxes,
        highlight.as_deref(),
    );
    let png = encode_png(&overlay.image).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

#[derive(Serialize)]
pub struct RegionDto {
    pub field: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Serialize)]
pub struct LegendResponse {
    pub rotation: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub scale: f32,
    pub legend: Vec<LegendEntry>,
    pub regions: Vec<RegionDto>,
    pub highlight: Option<String>,
}

/// `GET /api/documents/:id/legend` — clickable legend entries and the
/// surface-space regions of every rendered box.
pub async fn legend_entries(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewportParams>,
) -> Result<Json<LegendResponse>, ApiError> {
    let record = fetch(&ctx, id)?;
    let (transform, regions, boxes) = surface_geometry(&ctx, &record, params.viewport()).await?;

    Ok(Json(LegendResponse {
        rotation: record.rotation.degrees(),
        display_width: transform.display_width,
        display_height: transform.display_height,
        scale: transform.scale,
        legend: legend(&boxes),
        regions: regions
            .iter()
            .map(|r| RegionDto {
                field: r.field.clone(),
                x: r.rect.x,
                y: r.rect.y,
                w: r.rect.w,
                h: r.rect.h,
            })
            .collect(),
        highlight: record.highlight.current().map(str::to_string),
    }))
}

#[derive(Deserialize)]
pub struct ClickRequest {
    /// Click position in surface pixels.
    pub x: f32,
    pub y: f32,
    pub width: Option<u32>,
    pub max_height: Option<u32>,
}

#[derive(Serialize)]
pub struct HighlightResponse {
    pub highlight: Option<String>,
}

/// `POST /api/documents/:id/click` — resolve a surface click.
///
/// A hit toggles that field's highlight (clicking the active one clears
/// it); a miss clears the selection. Responds with the new selection.
pub async fn click(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClickRequest>,
) -> Result<Json<HighlightResponse>, ApiError> {
    let record = fetch(&ctx, id)?;
    let viewport = Viewport {
        container_width: payload.width.unwrap_or(DEFAULT_WIDTH),
        max_height: payload.max_height.unwrap_or(DEFAULT_MAX_HEIGHT),
    };
    let (_, regions, _) = surface_geometry(&ctx, &record, viewport).await?;

    let highlight = match hit_test(&regions, payload.x, payload.y) {
        Some(field) => ctx
            .store
            .toggle_highlight(id, field)
            .ok_or_else(|| ApiError::NotFound("Document not found".into()))?,
        None => {
            ctx.store
                .clear_highlight(id)
                .ok_or_else(|| ApiError::NotFound("Document not found".into()))?;
            None
        }
    };
    Ok(Json(HighlightResponse { highlight }))
}

#[derive(Deserialize)]
pub struct HighlightRequest {
    pub field: String,
}

/// `POST /api/documents/:id/highlight` — toggle by field name (legend
/// entry clicks).
pub async fn highlight(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HighlightRequest>,
) -> Result<Json<HighlightResponse>, ApiError> {
    let highlight = ctx
        .store
        .toggle_highlight(id, &payload.field)
        .ok_or_else(|| ApiError::NotFound("Document not found".into()))?;
    Ok(Json(HighlightResponse { highlight }))
}

// ───────────────────────────────────────────────
// Shared plumbing
// ───────────────────────────────────────────────

fn fetch(ctx: &ApiContext, id: Uuid) -> Result<DocumentRecord, ApiError> {
    ctx.store
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Document not found".into()))
}

fn record_boxes(record: &DocumentRecord) -> Vec<FieldBox> {
    record
        .data
        .as_ref()
        .map(|payload| payload.field_boxes())
        .unwrap_or_default()
}

async fn source_bytes(ctx: &ApiContext, record: &DocumentRecord) -> Result<Vec<u8>, ApiError> {
    let source = record.image_preview.as_ref().ok_or(ApiError::NoImage)?;
    load_bytes(&ctx.http, source).await.ok_or(ApiError::NoImage)
}

/// Decode just enough of the image to know its natural size, then derive
/// the display transform and the mapped box regions.
async fn surface_geometry(
    ctx: &ApiContext,
    record: &DocumentRecord,
    viewport: Viewport,
) -> Result<(DisplayTransform, Vec<BoxRegion>, Vec<FieldBox>), ApiError> {
    let bytes = source_bytes(ctx, record).await?;
    let (natural_w, natural_h) = image::ImageReader::new(std::io::Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .into_dimensions()
        .map_err(|_| ApiError::NoImage)?;

    let transform = DisplayTransform::fit(natural_w, natural_h, record.rotation, viewport);
    let boxes = record_boxes(record);
    let regions = box_regions(&boxes, &transform);
    Ok((transform, regions, boxes))
}
