//! Health and status endpoints.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db;
use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Remote store reachability.
#[derive(Serialize)]
pub struct StatusResponse {
    pub reachable: bool,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /status - Is the remote table reachable, and how big is it.
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let table = state.config.buyers_table.clone();

    let response = match db::count_buyers(&state.pool, &table).await {
        Ok(records) => StatusResponse {
            reachable: true,
            table,
            records: Some(records),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Remote status check failed: {}", e);
            StatusResponse {
                reachable: false,
                table,
                records: None,
                error: Some(e.to_string()),
            }
        }
    };

    Json(response)
}

/// Root handler.
async fn root() -> &'static str {
    "Obsidian Buyer Intelligence"
}
