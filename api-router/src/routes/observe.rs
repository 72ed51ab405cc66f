use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::{api_state::ApiState, auth::CallerIdentity, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ObserveQuery {
    #[serde(default)]
    pub since: u64,
}

pub async fn observe(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Query(params): Query<ObserveQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (changes, current_sequence) = state
        .notebooks
        .observe(&state.db, &notebook_id, &caller.0, params.since)
        .await?;
    Ok(Json(serde_json::json!({
        "changes": changes,
        "current_sequence": current_sequence,
    })))
}
