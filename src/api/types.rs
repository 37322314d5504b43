//! Shared request context for the API layer.

use std::sync::Arc;

use crate::extraction::IdentityExtractor;
use crate::store::DocumentStore;

/// Shared state for all API routes: the document store, the extraction
/// seam, and the async HTTP client used to resolve remote image sources.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<DocumentStore>,
    pub extractor: Arc<dyn IdentityExtractor>,
    pub http: reqwest::Client,
}

impl ApiContext {
    pub fn new(store: Arc<DocumentStore>, extractor: Arc<dyn IdentityExtractor>) -> Self {
        Self {
            store,
            extractor,
            http: reqwest::Client::new(),
        }
    }
}
