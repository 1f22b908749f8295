//! Storage capabilities
//!
//! The sync and read paths only see these traits, so a test double can
//! stand in for SQLite or Redis without touching orchestration logic.

use std::time::Duration;

use async_trait::async_trait;

use super::models::Post;
use crate::error::{CacheError, StoreError};

/// Authoritative post storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert or update by `id`.
    ///
    /// Repeating a write updates title/body and `updated_at` in place;
    /// `id`, `user_id` and `created_at` are left alone.
    async fn upsert(&self, post: &Post) -> Result<(), StoreError>;

    /// All posts, newest `created_at` first. Empty store yields an empty vec.
    async fn list_all(&self) -> Result<Vec<Post>, StoreError>;
}

/// Key-value cache with per-key expiry
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Value for `key`, or `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}
