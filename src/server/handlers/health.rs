use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.status();
    Json(json!({
        "initialized": true,
        "catalog_size": status.catalog_size,
        "index_dimension": status.index_dimension,
        "embedder": status.embedder,
        "products_read": status.products_read,
        "dropped_rows": status.dropped_rows,
        "never_ordered": status.never_ordered,
        "top_k": status.top_k,
        "compose_with_llm": status.compose_with_llm,
        "llm_provider": status.llm_provider,
        "search_provider": status.search_provider,
    }))
}
