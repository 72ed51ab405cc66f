use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use common::error::AppError;
use common::storage::types::job::JobType;
use job_queue::JobQueue;
use serde::Deserialize;

use crate::{api_state::ApiState, auth::CallerIdentity, error::ApiError};

async fn require_write(state: &ApiState, notebook_id: &str, caller: &str) -> Result<(), ApiError> {
    let notebook = state.notebooks.get(&state.db, notebook_id).await?;
    if !notebook.can_write(caller) {
        return Err(ApiError::from(AppError::PermissionDenied(format!(
            "{caller} does not have write access to notebook {notebook_id}"
        ))));
    }
    Ok(())
}

pub async fn stats(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let notebook = state.notebooks.get(&state.db, &notebook_id).await?;
    if !notebook.can_read(&caller.0) {
        return Err(ApiError::from(AppError::PermissionDenied(format!(
            "{} does not have read access to notebook {notebook_id}",
            caller.0
        ))));
    }
    let queue = JobQueue::new(&state.db);
    let stats = queue.stats(&notebook_id).await?;
    let formatted: Vec<serde_json::Value> = stats
        .into_iter()
        .map(|((job_type, status), count)| {
            serde_json::json!({ "job_type": job_type, "status": status, "count": count })
        })
        .collect();
    Ok(Json(serde_json::json!({ "stats": formatted })))
}

#[derive(Debug, Deserialize)]
pub struct LeaseQuery {
    pub worker_id: String,
    #[serde(default)]
    pub r#type: Option<JobType>,
}

pub async fn next_job(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Query(params): Query<LeaseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_write(&state, &notebook_id, &caller.0).await?;

    let queue = JobQueue::new(&state.db);
    let leased = queue
        .lease_next(&notebook_id, &params.worker_id, params.r#type, state.config.lease_ttl_seconds)
        .await?;
    match leased {
        Some(job) => Ok(Json(job).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub worker_id: String,
    pub result: serde_json::Value,
}

pub async fn complete_job(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((notebook_id, job_id)): Path<(String, String)>,
    Json(body): Json<CompleteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_write(&state, &notebook_id, &caller.0).await?;

    let queue = JobQueue::new(&state.db);
    let job = queue
        .get(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;

    claim_graph::handlers::apply_result(&state.db, state.embedder.as_ref(), &state.config, &job, &body.result)
        .await?;
    queue.complete(&job_id, &body.worker_id).await?;

    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub worker_id: String,
    pub error: String,
}

pub async fn fail_job(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path((notebook_id, job_id)): Path<(String, String)>,
    Json(body): Json<FailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_write(&state, &notebook_id, &caller.0).await?;

    let queue = JobQueue::new(&state.db);
    queue.fail(&job_id, &body.worker_id, body.error).await?;
    Ok(StatusCode::OK)
}
