use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use common::error::AppError;
use retrieval::SearchIn;
use serde::Deserialize;

use crate::{api_state::ApiState, auth::CallerIdentity, error::ApiError};

fn default_max_results() -> usize {
    20
}

fn default_search_in() -> SearchIn {
    SearchIn::Content
}

#[derive(Debug, Deserialize)]
pub struct LexicalSearchQuery {
    pub query: String,
    #[serde(default = "default_search_in")]
    pub search_in: SearchIn,
    #[serde(default)]
    pub topic_prefix: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

pub async fn lexical_search(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Query(params): Query<LexicalSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_read(&state, &notebook_id, &caller.0).await?;

    let mut results = retrieval::lexical_search(
        &state.db,
        state.notebooks.entries(),
        &notebook_id,
        &params.query,
        params.search_in,
        params.max_results,
    )
    .await?;

    if let Some(prefix) = &params.topic_prefix {
        let entries = state.notebooks.entries();
        let mut filtered = Vec::with_capacity(results.len());
        for result in results {
            if let Some(entry) = entries.read(&state.db, &result.entry_id).await? {
                if entry.topic.starts_with(prefix.as_str()) {
                    filtered.push(result);
                }
            }
        }
        results = filtered;
    }

    Ok(Json(serde_json::json!({ "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct SemanticSearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    pub min_similarity: Option<f32>,
}

fn default_top_k() -> usize {
    10
}

pub async fn semantic_search(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Json(body): Json<SemanticSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_read(&state, &notebook_id, &caller.0).await?;

    let min_similarity = body.min_similarity.unwrap_or(state.config.min_similarity);
    let results = retrieval::semantic_search(
        &state.db,
        state.notebooks.entries(),
        state.embedder.as_ref(),
        &notebook_id,
        &body.query,
        body.top_k,
        min_similarity,
    )
    .await?;
    Ok(Json(serde_json::json!({ "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct HybridSearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

pub async fn hybrid_search(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Json(body): Json<HybridSearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_read(&state, &notebook_id, &caller.0).await?;

    let response = retrieval::hybrid_search(
        &state.db,
        state.notebooks.entries(),
        state.embedder.as_ref(),
        &notebook_id,
        &body.query,
        body.top_k,
        state.config.min_similarity,
        state.config.rrf_k,
    )
    .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    #[serde(default = "default_direction")]
    pub direction: retrieval::RelatedDirection,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_direction() -> retrieval::RelatedDirection {
    retrieval::RelatedDirection::All
}

pub async fn related(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((notebook_id, entry_id)): Path<(String, String)>,
    Query(params): Query<RelatedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_read(&state, &notebook_id, &caller.0).await?;

    let results = retrieval::related(
        &state.db,
        state.notebooks.entries(),
        &entry_id,
        params.direction,
        params.max_results,
    )
    .await?;
    Ok(Json(serde_json::json!({ "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct ClaimsBatchRequest {
    pub entry_ids: Vec<String>,
}

pub async fn claims_batch(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Json(body): Json<ClaimsBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_read(&state, &notebook_id, &caller.0).await?;

    let entries = retrieval::claims_batch(&state.db, state.notebooks.entries(), &body.entry_ids).await?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

async fn require_read(state: &ApiState, notebook_id: &str, caller: &str) -> Result<(), ApiError> {
    let notebook = state.notebooks.get(&state.db, notebook_id).await?;
    if !notebook.can_read(caller) {
        return Err(ApiError::from(AppError::PermissionDenied(format!(
            "{caller} does not have read access to notebook {notebook_id}"
        ))));
    }
    Ok(())
}
