//! Cron scheduler
//!
//! Fires registered jobs on five-field cron schedules (UTC). Every firing
//! runs on its own task with a fresh [`CancellationToken`]; the timer loop
//! never waits on a job.
//!
//! # Lifecycle
//! `Stopped` -> [`Scheduler::start`] -> `Running` -> [`Scheduler::stop`] -> `Stopped`.
//! Stopping prevents new firings. Runs already in flight finish on their own.

mod cron_expr;
mod jobs;

pub use cron_expr::CronExpr;
pub use jobs::{SYNC_JOB_NAME, run_bounded, sync_job};

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::metrics::{SCHEDULER_FIRINGS_TOTAL, SCHEDULER_JOBS_ACTIVE};

/// What to do when a job comes due while its previous run is still going
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Drop the new firing
    #[default]
    Skip,
    /// Start another run alongside the previous one
    Allow,
}

/// Work performed on each firing
pub type JobHandler = Arc<dyn Fn(CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

/// A named job bound to a cron expression
#[derive(Clone)]
pub struct ScheduledJob {
    name: String,
    schedule: String,
    overlap: OverlapPolicy,
    handler: JobHandler,
}

impl ScheduledJob {
    pub fn new<F, Fut>(name: impl Into<String>, schedule: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            overlap: OverlapPolicy::default(),
            handler: Arc::new(move |token: CancellationToken| -> BoxFuture<'static, ()> {
                Box::pin(handler(token))
            }),
        }
    }

    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }
}

impl std::fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("overlap", &self.overlap)
            .finish_non_exhaustive()
    }
}

enum State {
    Stopped,
    Running {
        shutdown: CancellationToken,
        driver: JoinHandle<()>,
    },
}

/// Cron scheduler
pub struct Scheduler {
    state: Mutex<State>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Stopped),
        }
    }

    /// Register `jobs` and start the timer loop
    ///
    /// Every expression is validated before anything is spawned, so a bad
    /// schedule leaves the scheduler stopped with nothing registered.
    ///
    /// # Errors
    /// - `AlreadyRunning` if the scheduler was started before
    /// - `DuplicateJob` if two jobs share a name
    /// - `InvalidExpression` for the first schedule that fails to parse
    pub fn start(&self, jobs: Vec<ScheduledJob>) -> Result<(), ScheduleError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*state, State::Running { .. }) {
            return Err(ScheduleError::AlreadyRunning);
        }

        let mut names = HashSet::new();
        let mut entries = Vec::with_capacity(jobs.len());
        for job in jobs {
            if !names.insert(job.name.clone()) {
                return Err(ScheduleError::DuplicateJob(job.name));
            }
            let expr =
                CronExpr::parse(&job.schedule).map_err(|reason| ScheduleError::InvalidExpression {
                    job: job.name.clone(),
                    expression: job.schedule.clone(),
                    reason,
                })?;
            entries.push(Entry {
                job,
                expr,
                in_flight: Arc::new(AtomicBool::new(false)),
                next: None,
            });
        }

        for entry in &entries {
            info!(
                job = %entry.job.name,
                schedule = %entry.expr.expression(),
                overlap = ?entry.job.overlap,
                "Registered scheduled job"
            );
        }
        SCHEDULER_JOBS_ACTIVE.set(entries.len() as i64);

        let shutdown = CancellationToken::new();
        let driver = tokio::spawn(drive(entries, shutdown.clone()));
        *state = State::Running { shutdown, driver };

        info!("Scheduler started");
        Ok(())
    }

    /// Stop firing new runs
    ///
    /// Returns once the timer loop has exited. Calling this on a stopped
    /// scheduler is a no-op.
    pub async fn stop(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *state, State::Stopped)
        };

        if let State::Running { shutdown, driver } = previous {
            shutdown.cancel();
            if let Err(error) = driver.await {
                warn!(%error, "Scheduler loop ended abnormally");
            }
            SCHEDULER_JOBS_ACTIVE.set(0);
            info!("Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*state, State::Running { .. })
    }
}

struct Entry {
    job: ScheduledJob,
    expr: CronExpr,
    in_flight: Arc<AtomicBool>,
    next: Option<DateTime<Utc>>,
}

/// Wall-clock reading advanced by the monotonic timer.
///
/// Sleeps and "now" come from the same source, so a wall-clock jump cannot
/// make the loop fire early or spin.
struct Clock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl Clock {
    fn new() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.wall + TimeDelta::from_std(self.mono.elapsed()).unwrap_or(TimeDelta::zero())
    }
}

async fn drive(mut entries: Vec<Entry>, shutdown: CancellationToken) {
    let clock = Clock::new();
    let start = clock.now();
    for entry in &mut entries {
        entry.next = entry.expr.next_after(&start);
    }

    loop {
        let Some(due_at) = entries.iter().filter_map(|e| e.next).min() else {
            info!("No future firings; scheduler loop exiting");
            return;
        };

        let wait = (due_at - clock.now()).to_std().unwrap_or(Duration::ZERO);
        debug!(?wait, next = %due_at, "Waiting for next firing");

        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }

        let now = clock.now();
        for entry in &mut entries {
            if entry.next.is_some_and(|next| next <= now) {
                fire(entry);
                // missed slots are not replayed
                entry.next = entry.expr.next_after(&now);
            }
        }
    }
}

/// Clears the in-flight flag when a skip-guarded run ends, even by panic
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn fire(entry: &Entry) {
    let name = entry.job.name.as_str();

    let guard = match entry.job.overlap {
        OverlapPolicy::Skip => {
            if entry.in_flight.swap(true, Ordering::AcqRel) {
                SCHEDULER_FIRINGS_TOTAL
                    .with_label_values(&[name, "skipped"])
                    .inc();
                warn!(job = name, "Previous run still in progress; skipping firing");
                return;
            }
            Some(InFlightGuard(Arc::clone(&entry.in_flight)))
        }
        OverlapPolicy::Allow => None,
    };

    SCHEDULER_FIRINGS_TOTAL
        .with_label_values(&[name, "started"])
        .inc();
    info!(job = name, "Firing scheduled job");

    let run = (entry.job.handler)(CancellationToken::new());
    tokio::spawn(async move {
        let _guard = guard;
        run.await;
    });
}
