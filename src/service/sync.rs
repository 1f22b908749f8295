//! Sync service
//!
//! Pulls the current batch from the external source and upserts it into the
//! store. Fetch-or-fail, store-or-skip: a failed fetch aborts the run, a
//! failed upsert is logged and the batch carries on.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::data::PostStore;
use crate::error::SyncError;
use crate::metrics::{UPSERTS_TOTAL, observe_sync_run};
use crate::source::PostSource;

/// Outcome of a successful sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Posts returned by the source
    pub fetched: usize,
    /// Posts written to the store
    pub applied: usize,
    /// Posts whose upsert failed and were skipped
    pub failed: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Stateless coordinator between source and store
pub struct SyncService {
    source: Arc<dyn PostSource>,
    store: Arc<dyn PostStore>,
}

impl SyncService {
    /// Create new sync service
    pub fn new(source: Arc<dyn PostSource>, store: Arc<dyn PostStore>) -> Self {
        Self { source, store }
    }

    /// Run one import
    ///
    /// Posts are upserted in the order the source returned them.
    ///
    /// # Errors
    /// Only a failed fetch fails the run. Dropping the future abandons the
    /// run; upserts already applied stay applied.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();

        let posts = match self.source.fetch().await {
            Ok(posts) => posts,
            Err(error) => {
                observe_sync_run("fetch_failed", started.elapsed());
                tracing::error!(%error, "Sync aborted: fetch failed");
                return Err(error.into());
            }
        };

        let fetched = posts.len();
        let mut applied = 0;
        let mut failed = 0;

        for post in &posts {
            match self.store.upsert(post).await {
                Ok(()) => {
                    applied += 1;
                    UPSERTS_TOTAL.with_label_values(&["success"]).inc();
                }
                Err(error) => {
                    failed += 1;
                    UPSERTS_TOTAL.with_label_values(&["error"]).inc();
                    tracing::warn!(post_id = post.id, %error, "Skipping post: upsert failed");
                }
            }
        }

        let elapsed = started.elapsed();
        observe_sync_run(if failed == 0 { "success" } else { "partial" }, elapsed);
        tracing::info!(fetched, applied, failed, ?elapsed, "Sync run finished");

        Ok(SyncReport {
            fetched,
            applied,
            failed,
            elapsed,
        })
    }
}
