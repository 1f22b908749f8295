//! Sync trigger and post listing

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::data::Post;
use crate::error::AppError;
use crate::service::SyncReport;

/// Body returned by a successful `GET /sync`
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub report: SyncReport,
}

/// GET /sync
///
/// Runs one import inline. Fails when the fetch fails, or when the store
/// took none of a non-empty batch.
async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    let report = state.sync.run().await?;

    if report.fetched > 0 && report.applied == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "store rejected all {} fetched posts",
            report.failed
        )));
    }

    Ok(Json(SyncResponse {
        message: "Posts synced successfully",
        report,
    }))
}

/// GET /items
async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = state.posts.list_posts().await?;
    Ok(Json(posts))
}

pub fn posts_router() -> Router<AppState> {
    Router::new()
        .route("/sync", get(trigger_sync))
        .route("/items", get(list_items))
}
