//! Sync endpoint routes.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::handlers::{handle_plan, handle_sync, PlanResponse, SyncRequest, SyncResponse};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_handler))
        .route("/sync/plan", get(plan_handler))
}

/// POST /sync - Push the local snapshot into the remote table.
///
/// The body is optional; an empty body syncs the configured file.
async fn sync_handler(State(state): State<AppState>, body: Bytes) -> Result<Json<SyncResponse>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SyncRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    let response = handle_sync(&state, request).await?;
    Ok(Json(response))
}

/// GET /sync/plan - Dry run: what a sync would change.
async fn plan_handler(State(state): State<AppState>) -> Result<Json<PlanResponse>> {
    let response = handle_plan(&state).await?;
    Ok(Json(response))
}
