//! Client seam to the external extraction service.
//!
//! The service runs a vision model that reads an identity document and
//! returns the field payload; this process never does inference itself.
//! The trait keeps the seam mockable, the HTTP implementation is the
//! production path, and the mock doubles as an offline demo backend.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::fields::FieldPayload;
use super::ExtractionError;

/// Document types the extraction prompts distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    #[default]
    Auto,
    Passport,
    DriverLicense,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Auto => "auto",
            DocumentKind::Passport => "passport",
            DocumentKind::DriverLicense => "driver_license",
        }
    }
}

/// Field extraction seam. Implementations are blocking; the processing
/// pipeline calls them from the blocking thread pool.
pub trait IdentityExtractor: Send + Sync {
    fn extract_fields(
        &self,
        image_bytes: &[u8],
        kind: DocumentKind,
        model: &str,
    ) -> Result<FieldPayload, ExtractionError>;
}

// ──────────────────────────────────────────────
// HttpExtractor
// ──────────────────────────────────────────────

#[derive(Serialize)]
struct ExtractRequest<'a> {
    model: &'a str,
    document_type: &'a str,
    /// Base64-encoded image bytes.
    image: String,
}

/// Production extractor: POSTs the image to the configured service and
/// parses the field payload it returns.
pub struct HttpExtractor {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpExtractor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl IdentityExtractor for HttpExtractor {
    fn extract_fields(
        &self,
        image_bytes: &[u8],
        kind: DocumentKind,
        model: &str,
    ) -> Result<FieldPayload, ExtractionError> {
        let _span = tracing::info_span!(
            "extract_fields",
            model,
            document_type = kind.as_str(),
            image_size = image_bytes.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let request = ExtractRequest {
            model,
            document_type: kind.as_str(),
            image: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| ExtractionError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: FieldPayload = response
            .json()
            .map_err(|e| ExtractionError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            fields = payload.0.len(),
            "field extraction complete"
        );
        Ok(payload)
    }
}

// ──────────────────────────────────────────────
// MockExtractor
// ──────────────────────────────────────────────

/// Extractor returning a fixed payload. Used by tests and as the offline
/// demo backend when no extraction service is deployed.
pub struct MockExtractor {
    payload: FieldPayload,
}

impl MockExtractor {
    pub fn new(payload: FieldPayload) -> Self {
        Self { payload }
    }

    /// A representative passport payload with plausible boxes.
    pub fn sample() -> Self {
        use super::fields::FieldObservation;

        let mut payload = FieldPayload::default();
        payload.insert("document_type", FieldObservation::new("passport"));
        payload.insert(
            "full_name",
            FieldObservation::new("JANE ELIZABETH DOE")
                .with_rect([210.0, 180.0, 640.0, 230.0])
                .with_confidence(0.97),
        );
        payload.insert(
            "date_of_birth",
            FieldObservation::new("12 APR 1990")
                .with_rect([210.0, 260.0, 450.0, 300.0])
                .with_confidence(0.94),
        );
        payload.insert(
            "document_number",
            FieldObservation::new("P8231994")
                .with_rect([520.0, 120.0, 700.0, 160.0])
                .with_confidence(0.99),
        );
        payload.insert(
            "expiry_date",
            FieldObservation::new("11 APR 2030")
                .with_rect([210.0, 340.0, 450.0, 380.0])
                .with_confidence(0.91),
        );
        payload.insert(
            "nationality",
            FieldObservation::new("UTOPIAN")
                .with_rect([460.0, 260.0, 640.0, 300.0])
                .with_confidence(0.88),
        );
        Self::new(payload)
    }
}

impl IdentityExtractor for MockExtractor {
    fn extract_fields(
        &self,
        _image_bytes: &[u8],
        _kind: DocumentKind,
        _model: &str,
    ) -> Result<FieldPayload, ExtractionError> {
        Ok(self.payload.clone())
    }
}
