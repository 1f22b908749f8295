//! Error types for PostSync
//!
//! Each component has its own error type so callers can tell a permanent
//! failure from a transient one. Everything that reaches an HTTP handler is
//! converted to `AppError`, which implements `IntoResponse`.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// =============================================================================
// External source
// =============================================================================

/// Failure while fetching posts from the external source
#[derive(Debug, Error)]
pub enum FetchError {
    /// The host could not be reached or the request could not be sent
    #[error("failed to make HTTP request: {0}")]
    Transport(#[source] reqwest::Error),

    /// 4xx from the source
    #[error("client error: {status}")]
    ClientStatus { status: u16 },

    /// 5xx from the source
    #[error("server error: {status}")]
    ServerStatus { status: u16 },

    /// Anything outside 2xx that is neither 4xx nor 5xx
    #[error("unexpected status code: {status}")]
    UnexpectedStatus { status: u16 },

    /// The response body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The response body is not a JSON array of posts
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Retry budget spent; carries the last underlying cause
    #[error("failed to fetch posts after {attempts} attempts in {elapsed:?}: {last}")]
    Exhausted {
        attempts: u32,
        elapsed: Duration,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt may succeed.
    ///
    /// Only 5xx responses are retried. Transport failures are treated as
    /// permanent, and so is a decode failure since the transport worked.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::ServerStatus { .. })
    }
}

// =============================================================================
// Record store
// =============================================================================

/// Failure talking to the relational store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

// =============================================================================
// Cache
// =============================================================================

/// Failure talking to the key-value cache
///
/// Never surfaced past the cache layer; reads fall back to the store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// =============================================================================
// Sync orchestrator
// =============================================================================

/// Run-level sync failure
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("sync run did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("sync run cancelled")]
    Cancelled,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Scheduler registration/lifecycle failure
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid schedule '{expression}' for job '{job}': {reason}")]
    InvalidExpression {
        job: String,
        expression: String,
        reason: String,
    },

    #[error("duplicate job name: {0}")]
    DuplicateJob(String),

    #[error("scheduler is already running")]
    AlreadyRunning,
}

// =============================================================================
// Application (HTTP-facing)
// =============================================================================

/// Application-wide error type
///
/// Converts to an HTTP response with a JSON `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// External source failure (502)
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Store failure (500)
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Sync run failure (502 for fetch, 504 for timeout)
    #[error("{0}")]
    Sync(#[from] SyncError),

    /// Scheduler failure (500)
    #[error("{0}")]
    Schedule(#[from] ScheduleError),

    /// Cache backend failure at startup (500)
    #[error("{0}")]
    Cache(#[from] CacheError),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(StoreError::Database(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message, error_type) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), "not_found"),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::Fetch(_) => (StatusCode::BAD_GATEWAY, self.to_string(), "fetch"),
            AppError::Sync(SyncError::Fetch(_)) => {
                (StatusCode::BAD_GATEWAY, self.to_string(), "fetch")
            }
            AppError::Sync(SyncError::TimedOut(_)) => {
                (StatusCode::GATEWAY_TIMEOUT, self.to_string(), "sync_timeout")
            }
            AppError::Sync(SyncError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string(), "sync_cancelled")
            }
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "database",
            ),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Schedule(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
                "schedule",
            ),
            AppError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), "cache"),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        };

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
