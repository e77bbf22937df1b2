use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::agent::Answer;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub q: Option<String>,
}

/// `GET /query?q=...`. Only a missing `q` is an HTTP error; everything
/// downstream resolves to answer text.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Answer>, ApiError> {
    let q = params
        .q
        .ok_or_else(|| ApiError::BadRequest("Missing query parameter 'q'".to_string()))?;

    Ok(Json(state.router.route(&q).await))
}
