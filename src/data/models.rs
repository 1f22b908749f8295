//! Data models
//!
//! Rust structs representing database entities and cache items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Post
// =============================================================================

/// A post imported from the external source
///
/// `id` is assigned by the source and is the natural key. Timestamps are
/// assigned by the store and are absent on freshly fetched posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    /// Owner reference
    pub user_id: i64,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Build a post as the source would deliver it (no timestamps)
    pub fn new(id: i64, user_id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            title: title.into(),
            body: body.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A user served by the in-memory directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}
