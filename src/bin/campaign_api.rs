//! Campaign Discovery API Server
//!
//! Read-only REST API over the discovery engine
//!
//! Usage:
//!   cargo run --bin campaign_api
//!
//! Environment:
//!   PORT / CAMPAIGN_API_PORT - Server port (default: 8080)
//!   CAMPAIGN_API_HOST        - Server host (default: 0.0.0.0)
//!   RUST_LOG                 - Log filter (default: info)
//!   LCD_URL, ESCROW_CODE_IDS, CACHE_MAX_IDLE_SECS, ... - see DiscoveryConfig::from_env

use campaign_discovery::api::{create_router, handlers::AppState, start_cleanup_task};
use campaign_discovery::utils::constants::{APP_NAME, APP_VERSION, DEFAULT_API_PORT};
use campaign_discovery::{DiscoveryConfig, DiscoveryEngine, LcdClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    info!("🚀 {} v{}", APP_NAME, APP_VERSION);

    let config = DiscoveryConfig::from_env()?;
    let engine = DiscoveryEngine::new(config.clone());
    match LcdClient::new(&config) {
        Ok(client) => engine.set_client(Some(Arc::new(client))),
        // Serve degraded; listings report CLIENT_UNAVAILABLE until restart.
        Err(e) => error!("❌ Could not create LCD client: {}", e),
    }

    let state = Arc::new(AppState::new(engine));

    // Start background cleanup tasks for rate limiter and cache
    start_cleanup_task();
    state.engine.start_eviction_task();

    let app = create_router(state.clone());

    // PORT is set by most hosting platforms, CAMPAIGN_API_PORT for local dev
    let host = std::env::var("CAMPAIGN_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("CAMPAIGN_API_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_API_PORT);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🌐 Campaign API listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /v1/campaigns?q=&page=&size=  - Filtered campaign page");
    info!("  GET  /v1/campaigns/featured        - Featured campaigns");
    info!("  GET  /v1/campaigns/:address        - Single campaign (address or name)");
    info!("  GET  /v1/tokens/:address           - CW20 token info");
    info!("  POST /v1/refresh                   - Re-crawl registries");
    info!("  POST /v1/refresh/:key              - Re-fetch one campaign or token");
    info!("  GET  /v1/stats                     - Cache statistics");
    info!("  GET  /v1/health                    - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    let stats = state.engine.stats();
    info!("🛑 Shutdown complete");
    info!(
        "   {} evaluations, {} invalidations, {} cached nodes",
        stats.evaluations, stats.invalidations, stats.nodes
    );

    Ok(())
}
