use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use common::error::AppError;
use retrieval::BrowseFilters;

use crate::{api_state::ApiState, auth::CallerIdentity, error::ApiError};

pub async fn browse(
    State(state): State<ApiState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(notebook_id): Path<String>,
    Query(filters): Query<BrowseFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let notebook = state.notebooks.get(&state.db, &notebook_id).await?;
    if !notebook.can_read(&caller.0) {
        return Err(ApiError::from(AppError::PermissionDenied(format!(
            "{} does not have read access to notebook {notebook_id}",
            caller.0
        ))));
    }
    let page = retrieval::browse(
        &state.db,
        state.notebooks.entries(),
        &notebook_id,
        &filters,
        state.config.review_threshold,
    )
    .await?;
    Ok(Json(page_response(page)))
}

fn page_response(page: retrieval::Page) -> serde_json::Value {
    serde_json::json!({ "entries": page.entries, "total": page.total })
}
