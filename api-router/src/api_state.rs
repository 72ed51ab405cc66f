use std::sync::Arc;

use common::storage::db::SurrealDbClient;
use common::utils::config::AppConfig;
use common::utils::embedding::EmbeddingService;
use notebook_store::NotebookManager;

use crate::auth::TokenValidator;

/// Shared state handed to every route, mirroring the teacher's `ApiState` — one cloneable
/// handle to the store, config and the pipeline components layered on top of it.
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub notebooks: Arc<NotebookManager>,
    pub embedder: Arc<dyn EmbeddingService>,
    pub token_validator: Arc<dyn TokenValidator>,
}

impl ApiState {
    pub fn new(
        db: Arc<SurrealDbClient>,
        config: AppConfig,
        notebooks: Arc<NotebookManager>,
        embedder: Arc<dyn EmbeddingService>,
        token_validator: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            db,
            config,
            notebooks,
            embedder,
            token_validator,
        }
    }
}
