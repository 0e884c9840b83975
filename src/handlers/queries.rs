//! Canned query handlers

use axum::{extract::{Path, State}, Json};
use serde::Serialize;

use crate::{AppState, AppResult, AppError};
use crate::models::{CannedQuery, CannedQueryInfo};
use crate::store::{fetch_rows, JsonRow};

#[derive(Debug, Serialize)]
pub struct QueryRunResponse {
    pub key: &'static str,
    pub title: &'static str,
    pub rows: Vec<JsonRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// List the query catalogue
pub async fn list() -> Json<Vec<CannedQueryInfo>> {
    Json(CannedQuery::ALL.into_iter().map(CannedQuery::info).collect())
}

/// Run one canned query
pub async fn run(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<QueryRunResponse>> {
    let query = CannedQuery::from_key(&key)
        .ok_or_else(|| AppError::NotFound(format!("Unknown query '{}'", key)))?;

    tracing::debug!("Running canned query {}", query.key());
    let fetched = fetch_rows(state.store.as_ref(), query).await;

    let message = fetched
        .data
        .is_empty()
        .then(|| "No results returned for this query.".to_string());

    Ok(Json(QueryRunResponse {
        key: query.key(),
        title: query.title(),
        rows: fetched.data,
        message,
        error: fetched.error,
    }))
}
