//! Cache layer
//!
//! Read-through caching of the "all posts" snapshot on top of a key-value
//! backend. The cache holds no authority: misses, undecodable entries and
//! backend failures all fall through to the loader (the database).
//!
//! Two backends are provided:
//! - `RedisCache` for deployments
//! - `MemoryCache` (Moka) for single-process runs and tests

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::traits::KeyValueCache;
use crate::error::CacheError;

/// Cache key for the snapshot of every stored post
pub const ALL_POSTS_KEY: &str = "posts:all";

// =============================================================================
// Redis backend
// =============================================================================

/// Redis-backed key-value cache
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis, e.g. `redis://localhost:6379`
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the server is unreachable
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!(url = %url, "Redis cache connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        // SET EX takes whole seconds; never round a short TTL down to "no expiry"
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}

// =============================================================================
// In-memory backend
// =============================================================================

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, MemoryEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &MemoryEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &MemoryEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory key-value cache
///
/// Each write chooses its own TTL; moka drops the entry once it lapses.
pub struct MemoryCache {
    entries: Cache<String, MemoryEntry>,
}

impl MemoryCache {
    /// Create new in-memory cache
    ///
    /// # Arguments
    /// * `max_items` - Maximum number of keys held at once
    pub fn new(max_items: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_items)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .get(key)
            .await
            .map(|entry| entry.value.to_string()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            value: Arc::from(value),
            ttl,
        };
        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.contains_key(key))
    }
}

// =============================================================================
// Read-through cache
// =============================================================================

/// Read-through cache over a key-value backend
///
/// Values are JSON-serialized sequences. Writes from the sync path do not
/// invalidate entries, so a read may be stale for up to one TTL.
pub struct PostCache {
    backend: Arc<dyn KeyValueCache>,
}

impl PostCache {
    /// Create new read-through cache
    pub fn new(backend: Arc<dyn KeyValueCache>) -> Self {
        Self { backend }
    }

    /// Raw serialized snapshot stored under `key`
    pub async fn read(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.backend.get(key).await
    }

    /// Store a serialized snapshot under `key` for `ttl`
    pub async fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.backend.set_ex(key, value, ttl).await
    }

    /// Drop the entry under `key`
    pub async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.backend.delete(key).await
    }

    /// Whether a live entry exists under `key`
    pub async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.exists(key).await
    }

    /// Serve `key` from cache, falling back to `loader` on a miss.
    ///
    /// A hit that fails to decode counts as a miss. After a miss the loaded
    /// sequence is written back with `ttl` unless it is empty. Cache errors
    /// are logged and never returned; only the loader's error is.
    pub async fn read_through<T, F, Fut, E>(
        &self,
        key: &str,
        loader: F,
        ttl: Duration,
    ) -> Result<Vec<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        use crate::metrics::{CACHE_ERRORS_TOTAL, CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};

        match self.read(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(items) => {
                    CACHE_HITS_TOTAL.with_label_values(&[key]).inc();
                    tracing::debug!(key, count = items.len(), "Cache hit");
                    return Ok(items);
                }
                Err(error) => {
                    CACHE_ERRORS_TOTAL.with_label_values(&[key, "decode"]).inc();
                    tracing::warn!(key, %error, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => {
                CACHE_MISSES_TOTAL.with_label_values(&[key]).inc();
                tracing::debug!(key, "Cache miss");
            }
            Err(error) => {
                CACHE_ERRORS_TOTAL.with_label_values(&[key, "read"]).inc();
                tracing::warn!(key, %error, "Cache read failed; falling back to loader");
            }
        }

        let items = loader().await?;

        if !items.is_empty() {
            match serde_json::to_string(&items) {
                Ok(raw) => {
                    if let Err(error) = self.write(key, &raw, ttl).await {
                        CACHE_ERRORS_TOTAL.with_label_values(&[key, "write"]).inc();
                        tracing::warn!(key, %error, "Cache write failed");
                    }
                }
                Err(error) => {
                    tracing::warn!(key, %error, "Failed to serialize cache value");
                }
            }
        }

        Ok(items)
    }
}
