use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use common::storage::types::notebook::Notebook;
use serde::{Deserialize, Serialize};

use crate::{api_state::ApiState, auth::CallerIdentity, error::ApiError};

#[derive(Debug, Serialize)]
pub struct NotebookSummary {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub sequence_counter: u64,
    pub total_entropy: f32,
}

impl From<Notebook> for NotebookSummary {
    fn from(n: Notebook) -> Self {
        Self {
            id: n.id,
            name: n.name,
            owner: n.owner,
            sequence_counter: n.sequence_counter,
            total_entropy: n.total_entropy,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListNotebooksResponse {
    pub notebooks: Vec<NotebookSummary>,
}

pub async fn list_notebooks(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
) -> Result<impl IntoResponse, ApiError> {
    let notebooks = state.notebooks.list_notebooks(&state.db, &caller.0).await?;
    Ok(Json(ListNotebooksResponse {
        notebooks: notebooks.into_iter().map(NotebookSummary::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateNotebookRequest {
    pub name: String,
}

pub async fn create_notebook(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(body): Json<CreateNotebookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notebook = state.notebooks.create(&state.db, body.name, caller.0).await?;
    Ok(Json(NotebookSummary::from(notebook)))
}

#[derive(Debug, Deserialize)]
pub struct RenameNotebookRequest {
    pub name: String,
}

pub async fn rename_notebook(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Json(body): Json<RenameNotebookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let notebook = state
        .notebooks
        .rename(&state.db, &notebook_id, &caller.0, body.name)
        .await?;
    Ok(Json(NotebookSummary::from(notebook)))
}

pub async fn delete_notebook(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.notebooks.delete(&state.db, &notebook_id, &caller.0).await?;
    Ok(StatusCode::NO_CONTENT)
}
