pub mod api;
pub mod config;
pub mod extraction;
pub mod store;
pub mod viz;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, falling back to the default filter.
///
/// Called once from `main`; test binaries skip it so `cargo test` output
/// stays quiet.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
