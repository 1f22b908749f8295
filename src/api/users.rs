//! User lookup

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::AppState;
use crate::data::User;
use crate::error::AppError;

/// GET /users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid user id: {id}")))?;
    Ok(Json(state.users.get(id)?))
}

pub fn users_router() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user))
}
