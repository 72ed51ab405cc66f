use serde::{de::DeserializeOwned, Serialize};
use surrealdb::engine::any::{connect, Any};
use surrealdb::Surreal;

use crate::error::AppError;

/// Thin wrapper over an embedded SurrealDB connection, following the teacher's convention
/// of a single cloneable client shared across the core's components. `Any` lets production
/// point at a real endpoint while tests use `mem://`.
#[derive(Clone)]
pub struct SurrealDbClient {
    pub client: Surreal<Any>,
}

/// Anything persisted through `SurrealDbClient` implements this so generic helpers can
/// store/fetch it without each call site repeating the table name.
pub trait StoredObject: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn table_name() -> &'static str;
    fn get_id(&self) -> &str;
}

impl SurrealDbClient {
    pub async fn connect(address: &str, namespace: &str, database: &str) -> Result<Self, AppError> {
        let client = connect(address).await?;
        client.use_ns(namespace).use_db(database).await?;
        Ok(Self { client })
    }

    pub async fn memory(namespace: &str, database: &str) -> Result<Self, AppError> {
        Self::connect("mem://", namespace, database).await
    }

    pub async fn store_item<T>(&self, item: T) -> Result<Option<T>, AppError>
    where
        T: StoredObject,
    {
        Ok(self
            .client
            .create((T::table_name(), item.get_id().to_owned()))
            .content(item)
            .await?)
    }

    pub async fn get_item<T>(&self, id: &str) -> Result<Option<T>, AppError>
    where
        T: StoredObject,
    {
        Ok(self
            .client
            .select((T::table_name(), id.to_owned()))
            .await?)
    }

    pub async fn select_all<T>(&self) -> Result<Vec<T>, AppError>
    where
        T: StoredObject,
    {
        Ok(self.client.select(T::table_name()).await?)
    }

    pub async fn query(
        &self,
        sql: impl Into<String>,
    ) -> Result<surrealdb::Response, AppError> {
        Ok(self.client.query(sql.into()).await?)
    }

    /// Defines the tables and indexes the core's components rely on. Idempotent: SurrealDB's
    /// `DEFINE ... OVERWRITE` semantics make repeated calls safe across restarts.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        let statements = [
            "DEFINE TABLE notebook SCHEMALESS;",
            "DEFINE TABLE entry SCHEMALESS;",
            "DEFINE INDEX idx_entry_notebook ON entry FIELDS notebook_id;",
            "DEFINE INDEX idx_entry_sequence ON entry FIELDS notebook_id, sequence UNIQUE;",
            "DEFINE TABLE claim SCHEMALESS;",
            "DEFINE INDEX idx_claim_entry ON claim FIELDS entry_id;",
            "DEFINE TABLE comparison SCHEMALESS;",
            "DEFINE INDEX idx_comparison_pair ON comparison FIELDS entry_a, entry_b UNIQUE;",
            "DEFINE TABLE job SCHEMALESS;",
            "DEFINE INDEX idx_job_notebook ON job FIELDS notebook_id;",
            "DEFINE INDEX idx_job_status ON job FIELDS status.kind;",
            "DEFINE INDEX idx_job_created ON job FIELDS created_at;",
        ];
        for stmt in statements {
            self.client.query(stmt).await?;
        }
        Ok(())
    }
}
