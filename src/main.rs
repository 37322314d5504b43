use std::net::SocketAddr;
use std::sync::Arc;

use veridash::api::{start_server, ApiContext};
use veridash::extraction::{HttpExtractor, IdentityExtractor, MockExtractor};
use veridash::store::DocumentStore;
use veridash::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let extractor: Arc<dyn IdentityExtractor> = if config::use_mock_extractor() {
        tracing::warn!("using the mock extractor; set VERIDASH_EXTRACTOR_URL for real extraction");
        Arc::new(MockExtractor::sample())
    } else {
        Arc::new(HttpExtractor::new(config::extractor_url()))
    };

    let ctx = ApiContext::new(Arc::new(DocumentStore::new()), extractor);
    let addr = SocketAddr::from(([0, 0, 0, 0], config::server_port()));
    let mut server = start_server(ctx, addr).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    server.shutdown();
    Ok(())
}
