//! Buyer endpoint routes.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use obsidian_engine::{BuyerRecord, FilterOptions};

use crate::error::Result;
use crate::handlers::{
    handle_export, handle_filters, handle_get, handle_list, BuyerListResponse, BuyerQuery,
};
use crate::AppState;

/// Create buyer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/buyers", get(list_handler))
        .route("/buyers/filters", get(filters_handler))
        .route("/buyers/export", get(export_handler))
        .route("/buyers/{id}", get(get_handler))
}

/// GET /buyers - Search the current snapshot.
async fn list_handler(
    State(state): State<AppState>,
    Query(query): Query<BuyerQuery>,
) -> Result<Json<BuyerListResponse>> {
    let response = handle_list(&state, query).await?;
    Ok(Json(response))
}

/// GET /buyers/{id} - Fetch one buyer.
async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BuyerRecord>> {
    let record = handle_get(&state, &id).await?;
    Ok(Json(record))
}

/// GET /buyers/filters - Country and exporter picker values.
async fn filters_handler(State(state): State<AppState>) -> Result<Json<FilterOptions>> {
    let options = handle_filters(&state).await?;
    Ok(Json(options))
}

/// GET /buyers/export - Download matching buyers as JSON.
async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<BuyerQuery>,
) -> Result<impl IntoResponse> {
    let document = handle_export(&state, query).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"buyers.json\"",
            ),
        ],
        document,
    ))
}
