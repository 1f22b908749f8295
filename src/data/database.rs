//! SQLite database operations
//!
//! All database access goes through this module.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::Post;
use super::traits::PostStore;
use crate::error::StoreError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// sqlx connection string for `path`; creates the file if missing
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite:{}?mode=rwc", path.display())
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let pool = SqlitePool::connect(&sqlite_url(path)).await?;

        let db = Self { pool };
        db.migrate().await?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(db)
    }

    /// Create the `posts` and `users` tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                StoreError::Migration(e)
            })
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert or update a post keyed by its source id
    pub async fn upsert_post(&self, post: &Post) -> Result<(), StoreError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, title, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All posts ordered by creation time, newest first
    pub async fn get_posts(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, title, body, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Get a single post by id
    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, user_id, title, body, created_at, updated_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Number of stored posts
    pub async fn count_posts(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl PostStore for Database {
    async fn upsert(&self, post: &Post) -> Result<(), StoreError> {
        self.upsert_post(post).await
    }

    async fn list_all(&self) -> Result<Vec<Post>, StoreError> {
        self.get_posts().await
    }
}
