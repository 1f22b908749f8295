//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::sync::Arc;

use postsync::config::{
    AppConfig, CacheBackend, CacheConfig, DatabaseConfig, LoggingConfig, RetryConfig,
    SchedulerConfig, ServerConfig, SourceConfig,
};
use postsync::data::{Database, MemoryCache};
use postsync::scheduler::OverlapPolicy;
use postsync::source::HttpPostSource;
use postsync::{AppState, build_router};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
///
/// Serves the real router over a temp SQLite file, an in-memory cache and a
/// mockito stand-in for the external posts endpoint.
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub source: mockito::ServerGuard,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        let source = mockito::Server::new_async().await;

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = test_config(db_path.clone(), format!("{}/posts", source.url()));

        let db = Database::connect(&db_path).await.unwrap();
        let http = HttpPostSource::new(
            reqwest::Client::new(),
            config.source.url.clone(),
            config.retry.policy(),
        );
        let state = AppState::from_parts(
            config,
            db,
            Arc::new(MemoryCache::default()),
            Arc::new(http),
        );

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            source,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Make the mocked source answer `GET /posts` with `body`
    pub async fn serve_posts(&mut self, body: serde_json::Value) -> mockito::Mock {
        self.source
            .mock("GET", "/posts")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Make the mocked source answer `GET /posts` with `status`
    pub async fn fail_posts(&mut self, status: usize) -> mockito::Mock {
        self.source
            .mock("GET", "/posts")
            .with_status(status)
            .create_async()
            .await
    }
}

/// Configuration with fast retries and a memory cache
pub fn test_config(db_path: std::path::PathBuf, source_url: String) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
        },
        database: DatabaseConfig { path: db_path },
        cache: CacheConfig {
            backend: CacheBackend::Memory,
            host: "localhost".to_string(),
            port: 6379,
            ttl_seconds: 60,
        },
        source: SourceConfig {
            url: source_url,
            request_timeout_seconds: 5,
        },
        retry: RetryConfig {
            initial_interval_ms: 5,
            multiplier: 2.0,
            max_interval_ms: 20,
            max_elapsed_ms: 200,
        },
        scheduler: SchedulerConfig {
            enabled: false,
            sync_schedule: "*/15 * * * *".to_string(),
            run_timeout_seconds: 600,
            overlap: OverlapPolicy::Skip,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Three posts in the source's wire format
pub fn sample_posts() -> serde_json::Value {
    serde_json::json!([
        {"userId": 1, "id": 1, "title": "first", "body": "one"},
        {"userId": 1, "id": 2, "title": "second", "body": "two"},
        {"userId": 2, "id": 3, "title": "third", "body": "three"}
    ])
}
