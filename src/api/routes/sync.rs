use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::sync::SyncStatus;

pub fn router() -> Router {
    Router::new()
        .route("/mongodb-to-dynamodb", post(run_sync))
        .route("/status", get(status))
}

/// Run a synchronization pass and return its result
///
/// Rejected with 409 while another pass is running.
pub async fn run_sync(Extension(state): Extension<AppState>) -> Result<Json<SyncStatus>, ApiError> {
    Ok(Json(state.sync.sync_to_secondary().await?))
}

pub async fn status(Extension(state): Extension<AppState>) -> Json<SyncStatus> {
    Json(state.sync.status().await)
}
