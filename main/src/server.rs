use std::sync::Arc;

use api_router::api_routes_v1;
use api_router::api_state::ApiState;
use api_router::auth::DeterministicTokenValidator;
use axum::Router;
use common::storage::db::SurrealDbClient;
use common::utils::config::get_config;
use common::utils::embedding::HashedEmbeddingService;
use notebook_store::NotebookManager;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EMBEDDING_DIMENSION: usize = 128;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

    let db = Arc::new(
        SurrealDbClient::connect(
            &config.surrealdb_address,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );
    db.ensure_schema().await?;

    let notebooks = Arc::new(NotebookManager::new());
    let embedder = Arc::new(HashedEmbeddingService::new(EMBEDDING_DIMENSION));
    let token_validator = Arc::new(DeterministicTokenValidator);

    let port = config.http_port;
    let api_state = ApiState::new(db, config, notebooks, embedder, token_validator);

    let app: Router = Router::new().nest("/api/v1", api_routes_v1(&api_state)).with_state(api_state);

    let addr = format!("0.0.0.0:{port}");
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
