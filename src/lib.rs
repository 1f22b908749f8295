//! PostSync - scheduled post import with a cache-aside read path
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 API Layer (Axum) / Scheduler                 │
//! │  - GET /sync, /items, /users/:id, /health, /metrics          │
//! │  - cron-driven sync job with a bounded run window            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Sync orchestration (fetch, then upsert each post)         │
//! │  - Post listing through the read-through cache               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Source / Data Layer                             │
//! │  - HTTP source client with retry/backoff (reqwest)           │
//! │  - SQLite (sqlx)                                             │
//! │  - Redis or in-memory (moka) cache                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `scheduler`: cron scheduler and the sync job
//! - `service`: Business logic layer
//! - `source`: External source client
//! - `data`: Database and cache layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod scheduler;
pub mod service;
pub mod shutdown;
pub mod source;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Read-through cache in front of the database
    pub cache: Arc<data::PostCache>,

    /// Cache-aside post listing
    pub posts: Arc<service::PostService>,

    /// Source-to-store import
    pub sync: Arc<service::SyncService>,

    /// In-memory user lookup
    pub users: Arc<service::UserDirectory>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and apply migrations
    /// 2. Connect to the configured cache backend
    /// 3. Build the HTTP source client
    /// 4. Wire services
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Connect to cache
        let backend = Self::connect_cache(&config.cache).await?;

        // 3. Build source client
        let client = source::HttpPostSource::build_client(std::time::Duration::from_secs(
            config.source.request_timeout_seconds,
        ))?;
        let source = source::HttpPostSource::new(client, &config.source.url, config.retry.policy());
        tracing::info!(url = %source.url(), "Source client ready");

        let state = Self::from_parts(config, db, backend, Arc::new(source));
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// Wire services from already-built parts
    ///
    /// Used by `new` and by tests that substitute the source or the cache.
    pub fn from_parts(
        config: config::AppConfig,
        db: data::Database,
        backend: Arc<dyn data::KeyValueCache>,
        source: Arc<dyn source::PostSource>,
    ) -> Self {
        let db = Arc::new(db);
        let store: Arc<dyn data::PostStore> = db.clone();
        let cache = Arc::new(data::PostCache::new(backend));

        let posts = service::PostService::new(store.clone(), cache.clone(), config.cache.ttl());
        let sync = service::SyncService::new(source, store);

        Self {
            config: Arc::new(config),
            db,
            cache,
            posts: Arc::new(posts),
            sync: Arc::new(sync),
            users: Arc::new(service::UserDirectory::seeded()),
        }
    }

    async fn connect_cache(
        cache: &config::CacheConfig,
    ) -> Result<Arc<dyn data::KeyValueCache>, error::AppError> {
        match cache.backend {
            config::CacheBackend::Redis => {
                let redis = data::RedisCache::connect(&cache.redis_url()).await?;
                Ok(Arc::new(redis))
            }
            config::CacheBackend::Memory => {
                tracing::info!("Using in-memory cache");
                Ok(Arc::new(data::MemoryCache::default()))
            }
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::posts_router())
        .merge(api::users_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
