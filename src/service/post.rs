//! Post service
//!
//! Serves the stored post list through the read-through cache.

use std::sync::Arc;
use std::time::Duration;

use crate::data::{ALL_POSTS_KEY, Post, PostCache, PostStore};
use crate::error::AppError;

/// Post service
pub struct PostService {
    store: Arc<dyn PostStore>,
    cache: Arc<PostCache>,
    ttl: Duration,
}

impl PostService {
    /// Create new post service
    ///
    /// # Arguments
    /// * `store` - Backing record store
    /// * `cache` - Read-through cache in front of the store
    /// * `ttl` - Lifetime of a cached snapshot
    pub fn new(store: Arc<dyn PostStore>, cache: Arc<PostCache>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    /// All stored posts, newest first
    ///
    /// A snapshot may trail the store by up to one TTL after a sync.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let store = Arc::clone(&self.store);
        let posts = self
            .cache
            .read_through(ALL_POSTS_KEY, || async move { store.list_all().await }, self.ttl)
            .await?;
        Ok(posts)
    }

    /// Drop the cached snapshot so the next read hits the store
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.cache.invalidate(ALL_POSTS_KEY).await?;
        Ok(())
    }
}
