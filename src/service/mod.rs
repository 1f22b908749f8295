//! Service layer
//!
//! Business logic separated from HTTP handlers and the scheduler.

mod post;
mod sync;
mod user;

pub use post::PostService;
pub use sync::{SyncReport, SyncService};
pub use user::UserDirectory;
