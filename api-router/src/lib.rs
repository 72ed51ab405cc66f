use axum::{
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use api_state::ApiState;
use auth::bearer_auth;
use routes::{browse, entries, jobs, notebooks, observe, search};

pub mod api_state;
pub mod auth;
pub mod error;
mod routes;

/// Router for the notebook API, version 1. Auth applies uniformly: the spec has no
/// unauthenticated probe endpoints, so unlike the teacher's split public/protected
/// merge, every route here sits behind `bearer_auth`.
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/notebooks", get(notebooks::list_notebooks).post(notebooks::create_notebook))
        .route(
            "/notebooks/{id}",
            patch(notebooks::rename_notebook).delete(notebooks::delete_notebook),
        )
        .route("/notebooks/{id}/batch", post(entries::batch_write))
        .route("/notebooks/{id}/entries/{eid}", get(entries::get_entry))
        .route("/notebooks/{id}/browse", get(browse::browse))
        .route("/notebooks/{id}/search", get(search::lexical_search))
        .route("/notebooks/{id}/semantic-search", post(search::semantic_search))
        .route("/notebooks/{id}/hybrid-search", post(search::hybrid_search))
        .route("/notebooks/{id}/related/{eid}", get(search::related))
        .route("/notebooks/{id}/claims/batch", post(search::claims_batch))
        .route("/notebooks/{id}/observe", get(observe::observe))
        .route("/notebooks/{id}/jobs/stats", get(jobs::stats))
        .route("/notebooks/{id}/jobs/next", get(jobs::next_job))
        .route("/notebooks/{id}/jobs/{jid}/complete", post(jobs::complete_job))
        .route("/notebooks/{id}/jobs/{jid}/fail", post(jobs::fail_job))
        .route_layer(from_fn_with_state(app_state.clone(), bearer_auth))
}
