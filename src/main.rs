//! PostSync HTTP server entry point

use postsync::scheduler::{Scheduler, sync_job};
use postsync::{AppState, config};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging
/// 3. Initialize AppState
/// 4. Start the scheduler if enabled
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging and metrics
    postsync::logging::init(&config.logging);
    tracing::info!("Starting PostSync...");
    postsync::metrics::init_metrics();
    tracing::info!(
        addr = %config.server.bind_addr(),
        source = %config.source.url,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let state = AppState::new(config).await?;
    let config = state.config.clone();

    // 5. Start scheduler
    let scheduler = Scheduler::new();
    if config.scheduler.enabled {
        scheduler.start(vec![sync_job(state.sync.clone(), &config.scheduler)])?;
    } else {
        tracing::info!("Scheduler disabled; sync runs only via GET /sync");
    }

    // 6. Start HTTP server
    let app = postsync::build_router(state.clone());
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(postsync::shutdown::shutdown_signal())
        .await?;

    scheduler.stop().await;
    state.db.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
