//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Sync Metrics
    pub static ref SYNC_RUNS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_sync_runs_total", "Total number of sync runs"),
        &["status"]
    ).expect("metric can be created");
    pub static ref SYNC_RUN_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "postsync_sync_run_duration_seconds",
            "Sync run duration in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 600.0]),
        &["status"]
    ).expect("metric can be created");
    pub static ref UPSERTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_upserts_total", "Total number of post upserts"),
        &["status"]
    ).expect("metric can be created");

    // Source Metrics
    pub static ref FETCH_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_fetch_attempts_total", "Total number of external source fetch attempts"),
        &["outcome"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_cache_errors_total", "Total number of swallowed cache errors"),
        &["cache_name", "operation"]
    ).expect("metric can be created");

    // Scheduler Metrics
    pub static ref SCHEDULER_FIRINGS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_scheduler_firings_total", "Total number of scheduled job firings"),
        &["job", "outcome"]
    ).expect("metric can be created");
    pub static ref SCHEDULER_JOBS_ACTIVE: IntGauge = IntGauge::new(
        "postsync_scheduler_jobs_active",
        "Number of registered jobs while the scheduler is running"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("postsync_errors_total", "Total number of errors returned to HTTP clients"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(SYNC_RUNS_TOTAL.clone()))
        .expect("SYNC_RUNS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SYNC_RUN_DURATION_SECONDS.clone()))
        .expect("SYNC_RUN_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(UPSERTS_TOTAL.clone()))
        .expect("UPSERTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FETCH_ATTEMPTS_TOTAL.clone()))
        .expect("FETCH_ATTEMPTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_HITS_TOTAL.clone()))
        .expect("CACHE_HITS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_MISSES_TOTAL.clone()))
        .expect("CACHE_MISSES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_ERRORS_TOTAL.clone()))
        .expect("CACHE_ERRORS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SCHEDULER_FIRINGS_TOTAL.clone()))
        .expect("SCHEDULER_FIRINGS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SCHEDULER_JOBS_ACTIVE.clone()))
        .expect("SCHEDULER_JOBS_ACTIVE can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Record the outcome and duration of a sync run.
pub fn observe_sync_run(status: &str, elapsed: Duration) {
    SYNC_RUNS_TOTAL.with_label_values(&[status]).inc();
    SYNC_RUN_DURATION_SECONDS
        .with_label_values(&[status])
        .observe(elapsed.as_secs_f64());
}
