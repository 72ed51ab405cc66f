//! Entry Store (A, §4.1): append-only persistence, sequence assignment, reference and
//! fragment resolution. Batch writes serialize on the notebook's lock; the whole batch
//! commits or none of it does.
use std::collections::HashSet;

use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::{Entry, EntryInput, WriteResult};
use common::storage::types::job::{DistillClaimsPayload, JobType};
use common::storage::types::notebook::Notebook;
use job_queue::JobQueue;
use tracing::info;

use crate::integration_cost::compute_integration_cost;
use crate::locks::NotebookLocks;

pub const MAX_BATCH_SIZE: usize = 100;

pub struct EntryStore {
    locks: NotebookLocks,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    pub fn new() -> Self {
        Self {
            locks: NotebookLocks::new(),
        }
    }

    pub async fn next_sequence(&self, db: &SurrealDbClient, notebook_id: &str) -> Result<u64, AppError> {
        let notebook: Notebook = db
            .get_item(notebook_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("notebook {notebook_id} not found")))?;
        Ok(notebook.sequence_counter + 1)
    }

    pub async fn read(&self, db: &SurrealDbClient, entry_id: &str) -> Result<Option<Entry>, AppError> {
        db.get_item(entry_id).await
    }

    /// All entries in a notebook, unfiltered — the snapshot the cost engine, catalog and
    /// retrieval layer all read from.
    pub async fn list_all(&self, db: &SurrealDbClient, notebook_id: &str) -> Result<Vec<Entry>, AppError> {
        Ok(db
            .client
            .query("SELECT * FROM entry WHERE notebook_id = $notebook_id")
            .bind(("notebook_id", notebook_id.to_string()))
            .await?
            .take(0)?)
    }

    pub async fn revisions_of(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        entry_id: &str,
    ) -> Result<Vec<Entry>, AppError> {
        let mut revisions: Vec<Entry> = db
            .client
            .query("SELECT * FROM entry WHERE notebook_id = $notebook_id AND revision_of = $entry_id")
            .bind(("notebook_id", notebook_id.to_string()))
            .bind(("entry_id", entry_id.to_string()))
            .await?
            .take(0)?;
        revisions.sort_by_key(|e| e.sequence);
        Ok(revisions)
    }

    /// Writes a batch of entries atomically under the notebook's exclusive lock (§4.1).
    /// Validation runs over the full batch before any entry is persisted so a single
    /// invalid entry fails the whole batch with no partial commit.
    pub async fn write_batch(
        &self,
        db: &SurrealDbClient,
        notebook_id: &str,
        inputs: Vec<EntryInput>,
        author: String,
        default_max_attempts: u32,
    ) -> Result<Vec<WriteResult>, AppError> {
        if inputs.is_empty() {
            return Err(AppError::Validation("batch must contain at least one entry".into()));
        }
        if inputs.len() > MAX_BATCH_SIZE {
            return Err(AppError::Validation(format!(
                "batch of {} exceeds max size {}",
                inputs.len(),
                MAX_BATCH_SIZE
            )));
        }

        let lock = self.locks.get(notebook_id).await;
        let _guard = lock.lock().await;

        let notebook: Notebook = db
            .get_item(notebook_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("notebook {notebook_id} not found")))?;

        let mut snapshot = self.list_all(db, notebook_id).await?;
        let pre_batch_ids: HashSet<String> = snapshot.iter().map(|e| e.id.clone()).collect();

        // -- validation pass: revision_of / fragment_of must resolve against what existed
        // before this batch started; fragment siblings within the same batch may not
        // collide on fragment_index. No mutation happens in this pass.
        let mut seen_fragment_slots: HashSet<(String, u32)> = HashSet::new();
        for input in &inputs {
            if let Some(rev_id) = &input.revision_of {
                if !pre_batch_ids.contains(rev_id) {
                    return Err(AppError::Validation(format!(
                        "revision_of target {rev_id} does not exist"
                    )));
                }
            }
            if let Some(parent_id) = &input.fragment_of {
                if !pre_batch_ids.contains(parent_id) {
                    return Err(AppError::Validation(format!(
                        "fragment_of target {parent_id} does not exist"
                    )));
                }
                if let Some(idx) = input.fragment_index {
                    if !seen_fragment_slots.insert((parent_id.clone(), idx)) {
                        return Err(AppError::Validation(format!(
                            "duplicate fragment_index {idx} for fragment_of {parent_id}"
                        )));
                    }
                }
            }
        }

        let job_queue = JobQueue::new(db);
        let mut results = Vec::with_capacity(inputs.len());
        let mut sequence = notebook.sequence_counter;
        let mut total_entropy = notebook.total_entropy;

        for input in inputs {
            let revision_target = input
                .revision_of
                .as_ref()
                .and_then(|id| snapshot.iter().find(|e| &e.id == id).cloned());

            let cost = compute_integration_cost(&input, revision_target.as_ref(), &snapshot);

            sequence += 1;

            let existing_ids: HashSet<&str> = snapshot.iter().map(|e| e.id.as_str()).collect();
            let references: Vec<String> = input
                .references
                .iter()
                .filter(|r| existing_ids.contains(r.as_str()))
                .cloned()
                .collect();

            let topic = revision_target
                .as_ref()
                .map(|t| t.topic.clone())
                .unwrap_or(input.topic);

            let entry = Entry {
                id: Entry::new_id(),
                notebook_id: notebook_id.to_string(),
                content: input.content,
                content_type: input.content_type,
                topic,
                references,
                revision_of: input.revision_of,
                fragment_of: input.fragment_of,
                fragment_index: input.fragment_index,
                author: author.clone(),
                created_at: chrono::Utc::now(),
                sequence,
                integration_cost: cost,
                claims_status: common::storage::types::entry::ClaimsStatus::Pending,
                integration_status: common::storage::types::entry::IntegrationStatus::Probation,
                max_friction: 0.0,
                embedding: None,
                secondary_topics: Vec::new(),
            };

            total_entropy += cost.weighted();

            db.store_item(entry.clone()).await?;

            let payload = serde_json::to_value(DistillClaimsPayload {
                entry_id: entry.id.clone(),
                content: entry.content.clone(),
                topic: entry.topic.clone(),
            })
            .map_err(AppError::Serialization)?;
            job_queue
                .enqueue(notebook_id, JobType::DistillClaims, payload, default_max_attempts)
                .await?;

            info!(notebook_id, entry_id = %entry.id, sequence, "entry written");

            results.push(WriteResult {
                entry_id: entry.id.clone(),
                sequence,
                integration_cost: cost,
            });

            snapshot.push(entry);
        }

        db.client
            .query("UPDATE type::thing('notebook', $id) SET sequence_counter = $seq, total_entropy = $entropy")
            .bind(("id", notebook_id.to_string()))
            .bind(("seq", sequence))
            .bind(("entropy", total_entropy))
            .await?;

        Ok(results)
    }
}
