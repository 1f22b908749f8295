//! Built-in scheduled jobs

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::ScheduledJob;
use crate::config::SchedulerConfig;
use crate::error::SyncError;
use crate::service::{SyncReport, SyncService};

/// Name of the periodic import job
pub const SYNC_JOB_NAME: &str = "sync_posts";

/// Run one sync, giving up after `limit` or when `token` is cancelled.
///
/// On timeout the token is cancelled so anything else watching it stops
/// too. Posts upserted before the cut-off stay in the store.
pub async fn run_bounded(
    sync: &SyncService,
    token: CancellationToken,
    limit: Duration,
) -> Result<SyncReport, SyncError> {
    tokio::select! {
        _ = token.cancelled() => Err(SyncError::Cancelled),
        result = tokio::time::timeout(limit, sync.run()) => match result {
            Ok(outcome) => outcome,
            Err(_) => {
                token.cancel();
                Err(SyncError::TimedOut(limit))
            }
        },
    }
}

/// The periodic import job described by `config`
pub fn sync_job(sync: Arc<SyncService>, config: &SchedulerConfig) -> ScheduledJob {
    let limit = config.run_timeout();

    ScheduledJob::new(SYNC_JOB_NAME, config.sync_schedule.clone(), move |token| {
        let sync = Arc::clone(&sync);
        async move {
            match run_bounded(&sync, token, limit).await {
                Ok(report) => tracing::info!(
                    job = SYNC_JOB_NAME,
                    fetched = report.fetched,
                    applied = report.applied,
                    failed = report.failed,
                    "Scheduled sync completed"
                ),
                Err(SyncError::TimedOut(limit)) => {
                    tracing::warn!(job = SYNC_JOB_NAME, ?limit, "Scheduled sync timed out")
                }
                Err(error) => tracing::error!(job = SYNC_JOB_NAME, %error, "Scheduled sync failed"),
            }
        }
    })
    .with_overlap(config.overlap)
}
