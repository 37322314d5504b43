//! API router.
//!
//! Returns a composable `Router` mounting all dashboard endpoints under
//! `/api/`, with CORS restricted to the configured frontend origins.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;

/// Build the dashboard API router.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route("/api/upload", post(endpoints::documents::upload))
        .route("/api/documents", get(endpoints::documents::list))
        .route("/api/documents/:id", get(endpoints::documents::detail))
        .route(
            "/api/documents/:id/reprocess",
            post(endpoints::documents::reprocess),
        )
        .route(
            "/api/documents/:id/overlay",
            get(endpoints::overlay::render),
        )
        .route(
            "/api/documents/:id/legend",
            get(endpoints::overlay::legend_entries),
        )
        .route("/api/documents/:id/click", post(endpoints::overlay::click))
        .route(
            "/api/documents/:id/highlight",
            post(endpoints::overlay::highlight),
        )
        .with_state(ctx)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::allowed_origins()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
