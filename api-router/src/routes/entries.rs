use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use common::storage::types::entry::{EntryInput, WriteResult};
use serde::Deserialize;

use crate::{api_state::ApiState, auth::CallerIdentity, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct BatchWriteRequest {
    pub entries: Vec<EntryInput>,
    pub author: String,
}

#[derive(Debug, serde::Serialize)]
pub struct BatchWriteResponse {
    pub results: Vec<WriteResult>,
}

pub async fn batch_write(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Json(body): Json<BatchWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .notebooks
        .write_batch(
            &state.db,
            &notebook_id,
            &caller.0,
            body.entries,
            body.author,
            state.config.default_max_attempts,
        )
        .await?;
    Ok(Json(BatchWriteResponse { results }))
}

pub async fn get_entry(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((notebook_id, entry_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let notebook = state.notebooks.get(&state.db, &notebook_id).await?;
    if !notebook.can_read(&caller.0) {
        return Err(common::error::AppError::PermissionDenied(format!(
            "{} does not have read access to notebook {notebook_id}",
            caller.0
        ))
        .into());
    }
    let detail = retrieval::entry_detail(&state.db, state.notebooks.entries(), &notebook_id, &entry_id)
        .await?
        .ok_or_else(|| common::error::AppError::NotFound(format!("entry {entry_id} not found")))?;
    Ok(Json(detail))
}
