//! Notebook Manager (G, §4.7): notebook CRUD, permission enforcement and the `observe`
//! change feed. Batch writes are delegated to `EntryStore` once the caller's `write`
//! grant is confirmed; the manager never touches entry persistence itself.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::{Entry, EntryInput, WriteResult};
use common::storage::types::notebook::{Notebook, Participant};
use tracing::info;

use crate::entry_store::EntryStore;

pub struct NotebookManager {
    entries: EntryStore,
}

impl Default for NotebookManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotebookManager {
    pub fn new() -> Self {
        Self {
            entries: EntryStore::new(),
        }
    }

    pub async fn create(&self, db: &SurrealDbClient, name: String, owner: String) -> Result<Notebook, AppError> {
        let notebook = Notebook::new(name, owner.clone());
        db.store_item(notebook.clone()).await?;
        info!(notebook_id = %notebook.id, owner, "notebook created");
        Ok(notebook)
    }

    pub async fn get(&self, db: &SurrealDbClient, notebook_id: &str) -> Result<Notebook, AppError> {
        db.get_item(notebook_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("notebook {notebook_id} not found")))
    }

    /// All notebooks where `entity` is a participant (owner or granted), per §4.7.
    pub async fn list_notebooks(&self, db: &SurrealDbClient, entity: &str) -> Result<Vec<Notebook>, AppError> {
        let all: Vec<Notebook> = db.select_all().await?;
        Ok(all.into_iter().filter(|n| n.is_participant(entity)).collect())
    }

    pub async fn rename(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        caller: &str,
        name: String,
    ) -> Result<Notebook, AppError> {
        let notebook = self.get(db, notebook_id).await?;
        if notebook.owner != caller {
            return Err(AppError::PermissionDenied(format!(
                "{caller} is not the owner of notebook {notebook_id}"
            )));
        }
        let mut response = db
            .client
            .query("UPDATE type::thing('notebook', $id) SET name = $name RETURN AFTER;")
            .bind(("id", notebook_id.to_string()))
            .bind(("name", name))
            .await?;
        let updated: Option<Notebook> = response.take(0)?;
        updated.ok_or_else(|| AppError::NotFound(format!("notebook {notebook_id} not found")))
    }

    pub async fn delete(&self, db: &SurrealDbClient, notebook_id: &str, caller: &str) -> Result<(), AppError> {
        let notebook = self.get(db, notebook_id).await?;
        if notebook.owner != caller {
            return Err(AppError::PermissionDenied(format!(
                "{caller} is not the owner of notebook {notebook_id}"
            )));
        }
        db.client
            .query("DELETE type::thing('notebook', $id);")
            .bind(("id", notebook_id.to_string()))
            .await?;
        info!(notebook_id, caller, "notebook deleted");
        Ok(())
    }

    /// Atomically adds or updates a participant's grant. Owner-only, matching §4.7's
    /// "participant add/remove edits the permissions set atomically".
    pub async fn set_participant(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        caller: &str,
        participant: Participant,
    ) -> Result<Notebook, AppError> {
        let mut notebook = self.get(db, notebook_id).await?;
        if notebook.owner != caller {
            return Err(AppError::PermissionDenied(format!(
                "{caller} is not the owner of notebook {notebook_id}"
            )));
        }
        notebook.participants.retain(|p| p.entity != participant.entity);
        notebook.participants.push(participant);
        db.client
            .query("UPDATE type::thing('notebook', $id) SET participants = $participants RETURN AFTER;")
            .bind(("id", notebook_id.to_string()))
            .bind(("participants", notebook.participants.clone()))
            .await?;
        Ok(notebook)
    }

    pub async fn remove_participant(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        caller: &str,
        entity: &str,
    ) -> Result<Notebook, AppError> {
        let mut notebook = self.get(db, notebook_id).await?;
        if notebook.owner != caller {
            return Err(AppError::PermissionDenied(format!(
                "{caller} is not the owner of notebook {notebook_id}"
            )));
        }
        notebook.participants.retain(|p| p.entity != entity);
        db.client
            .query("UPDATE type::thing('notebook', $id) SET participants = $participants RETURN AFTER;")
            .bind(("id", notebook_id.to_string()))
            .bind(("participants", notebook.participants.clone()))
            .await?;
        Ok(notebook)
    }

    /// Batch write orchestration: verifies `caller` holds `write` on the notebook, then
    /// delegates to the entry store (§4.1).
    pub async fn write_batch(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        caller: &str,
        inputs: Vec<EntryInput>,
        author: String,
        default_max_attempts: u32,
    ) -> Result<Vec<WriteResult>, AppError> {
        let notebook = self.get(db, notebook_id).await?;
        if !notebook.can_write(caller) {
            return Err(AppError::PermissionDenied(format!(
                "{caller} does not have write access to notebook {notebook_id}"
            )));
        }
        self.entries
            .write_batch(db, notebook_id, inputs, author, default_max_attempts)
            .await
    }

    pub async fn read_entry(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        caller: &str,
        entry_id: &str,
    ) -> Result<Entry, AppError> {
        let notebook = self.get(db, notebook_id).await?;
        if !notebook.can_read(caller) {
            return Err(AppError::PermissionDenied(format!(
                "{caller} does not have read access to notebook {notebook_id}"
            )));
        }
        let entry = self
            .entries
            .read(db, entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("entry {entry_id} not found")))?;
        if entry.notebook_id != notebook_id {
            return Err(AppError::NotFound(format!("entry {entry_id} not found")));
        }
        Ok(entry)
    }

    /// Entries written since `since` (exclusive), for the `/observe` change feed (§6),
    /// plus the notebook's current sequence counter.
    pub async fn observe(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        caller: &str,
        since: u64,
    ) -> Result<(Vec<Entry>, u64), AppError> {
        let notebook = self.get(db, notebook_id).await?;
        if !notebook.can_read(caller) {
            return Err(AppError::PermissionDenied(format!(
                "{caller} does not have read access to notebook {notebook_id}"
            )));
        }
        let mut changes = self.entries.list_all(db, notebook_id).await?;
        changes.retain(|e| e.sequence > since);
        changes.sort_by_key(|e| e.sequence);
        Ok((changes, notebook.sequence_counter))
    }

    pub fn entries(&self) -> &EntryStore {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::db::SurrealDbClient;

    async fn test_db() -> SurrealDbClient {
        let db = SurrealDbClient::memory("test", &uuid::Uuid::new_v4().to_string())
            .await
            .unwrap();
        db.ensure_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn non_owner_cannot_rename_or_delete() {
        let db = test_db().await;
        let manager = NotebookManager::new();
        let notebook = manager.create(&db, "n".into(), "alice".into()).await.unwrap();

        let err = manager
            .rename(&db, &notebook.id, "bob", "renamed".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));

        let err = manager.delete(&db, &notebook.id, "bob").await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn write_without_permission_is_rejected() {
        let db = test_db().await;
        let manager = NotebookManager::new();
        let notebook = manager.create(&db, "n".into(), "alice".into()).await.unwrap();

        let input = EntryInput {
            content: "hello".into(),
            content_type: "text/plain".into(),
            topic: "x".into(),
            references: vec![],
            revision_of: None,
            fragment_of: None,
            fragment_index: None,
        };

        let err = manager
            .write_batch(&db, &notebook.id, "mallory", vec![input], "mallory".into(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn list_notebooks_returns_only_participant_notebooks() {
        let db = test_db().await;
        let manager = NotebookManager::new();
        manager.create(&db, "alice-nb".into(), "alice".into()).await.unwrap();
        manager.create(&db, "bob-nb".into(), "bob".into()).await.unwrap();

        let alice_notebooks = manager.list_notebooks(&db, "alice").await.unwrap();
        assert_eq!(alice_notebooks.len(), 1);
        assert_eq!(alice_notebooks[0].name, "alice-nb");
    }
}
