//! API layer
//!
//! HTTP handlers for:
//! - Sync trigger and cached post listing
//! - User lookup
//! - Metrics (Prometheus)

pub mod metrics;
mod posts;
mod users;

pub use metrics::metrics_router;
pub use posts::{SyncResponse, posts_router};
pub use users::users_router;
