//! Environment-driven configuration.
//!
//! The service is configured entirely through environment variables so it
//! can run unchanged in a container or on a laptop next to the dashboard
//! frontend. Every accessor has a sensible local default.

/// Application-level constants
pub const APP_NAME: &str = "Veridash";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum accepted upload size in bytes (10 MB, matching the dashboard's
/// client-side limit).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "veridash=info,tower_http=warn"
}

/// TCP port for the HTTP API. `VERIDASH_PORT`, default 8000.
pub fn server_port() -> u16 {
    std::env::var("VERIDASH_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000)
}

/// Allowed CORS origins for the dashboard frontend.
/// `VERIDASH_ALLOWED_ORIGINS`, comma-separated, defaults to the usual
/// local dev servers.
pub fn allowed_origins() -> Vec<String> {
    std::env::var("VERIDASH_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Base URL of the field-extraction service.
/// `VERIDASH_EXTRACTOR_URL`, default a local deployment.
pub fn extractor_url() -> String {
    std::env::var("VERIDASH_EXTRACTOR_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8500/v1/extract".to_string())
}

/// Model identifier forwarded to the extraction service when the upload
/// does not name one. `VERIDASH_EXTRACTOR_MODEL`.
pub fn extractor_model() -> String {
    std::env::var("VERIDASH_EXTRACTOR_MODEL")
        .unwrap_or_else(|_| "qwen2.5-vl-32b-instruct".to_string())
}

/// Run against the built-in mock extractor instead of a deployed service.
/// `VERIDASH_MOCK_EXTRACTOR=1`; handy for frontend work offline.
pub fn use_mock_extractor() -> bool {
    std::env::var("VERIDASH_MOCK_EXTRACTOR").is_ok_and(|v| v == "1" || v == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_origins_cover_local_dev() {
        // Only meaningful when the env var is unset, which is the test default.
        if std::env::var("VERIDASH_ALLOWED_ORIGINS").is_err() {
            let origins = allowed_origins();
            assert!(origins.contains(&"http://localhost:3000".to_string()));
            assert!(origins.contains(&"http://localhost:5173".to_string()));
        }
    }

    #[test]
    fn default_port_is_8000() {
        if std::env::var("VERIDASH_PORT").is_err() {
            assert_eq!(server_port(), 8000);
        }
    }

    #[test]
    fn upload_cap_is_10_mb() {
        assert_eq!(MAX_UPLOAD_BYTES, 10 * 1024 * 1024);
    }
}
