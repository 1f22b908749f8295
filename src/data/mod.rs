//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations (source of truth)
//! - Read-through cache over Redis or memory (no authority)

mod cache;
mod database;
mod models;
mod traits;

pub use cache::{ALL_POSTS_KEY, MemoryCache, PostCache, RedisCache};
pub use database::{Database, sqlite_url};
pub use models::*;
pub use traits::{KeyValueCache, PostStore};

#[cfg(test)]
pub use traits::MockPostStore;

#[cfg(test)]
mod database_test;
