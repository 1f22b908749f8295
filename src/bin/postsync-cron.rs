//! Scheduler-only process: runs the sync job on its cron schedule

use postsync::scheduler::{Scheduler, sync_job};
use postsync::{AppState, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::load()?;
    postsync::logging::init(&config.logging);
    postsync::metrics::init_metrics();

    let state = AppState::new(config).await?;
    let config = state.config.clone();

    let scheduler = Scheduler::new();
    scheduler.start(vec![sync_job(state.sync.clone(), &config.scheduler)])?;
    tracing::info!(
        schedule = %config.scheduler.sync_schedule,
        timeout = ?config.scheduler.run_timeout(),
        "Cron worker running"
    );

    postsync::shutdown::shutdown_signal().await;

    scheduler.stop().await;
    state.db.close().await;
    tracing::info!("Cron worker stopped");

    Ok(())
}
