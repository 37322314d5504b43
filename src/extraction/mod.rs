//! Identity-field extraction: payload types, the field catalog, and the
//! client seam to the external vision-model service.

pub mod client;
pub mod fields;

pub use client::{DocumentKind, HttpExtractor, IdentityExtractor, MockExtractor};
pub use fields::{FieldObservation, FieldPayload, FIELD_CATALOG};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("extraction service unreachable: {0}")]
    Unreachable(String),

    #[error("extraction service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed extraction response: {0}")]
    InvalidResponse(String),
}
