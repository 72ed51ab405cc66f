//! Job completion dispatch (§4.3 "Result handlers"). This is where D (the queue), E (the
//! claim graph) and the embedding collaborator meet: a completed DISTILL_CLAIMS job stores
//! claims and fans out COMPARE_CLAIMS/CLASSIFY_TOPIC jobs; a completed COMPARE_CLAIMS job
//! stores a Comparison and recomputes both entries' derived status; a completed
//! CLASSIFY_TOPIC job sets or records a topic. Handlers are idempotent per (entry_id,
//! job_type) so at-least-once delivery (§4.3) never corrupts state.
use std::collections::HashSet;

use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::{ClaimsStatus, Entry};
use common::storage::types::job::{
    ClassifyResult, ClassifyTopicPayload, CompareClaimsPayload, CompareResult, DistillClaimsPayload,
    DistillResult, Job, JobType,
};
use common::utils::config::AppConfig;
use common::utils::embedding::EmbeddingService;
use job_queue::JobQueue;
use tracing::{info, warn};

use crate::claims::{claims_for_entry, store_distilled_claims};
use crate::comparisons::{comparisons_touching, derive_comparison, upsert_comparison};
use crate::status::{recompute_and_persist, StatusThresholds};

fn thresholds(config: &AppConfig) -> StatusThresholds {
    StatusThresholds {
        review_threshold: config.review_threshold,
        contested_threshold: config.contested_threshold,
        integrated_threshold: config.integrated_threshold,
        min_comparisons: config.min_comparisons,
    }
}

/// Parses and applies a job's completion result. Called by the API layer *before* the
/// queue marks the job completed, so a malformed result never consumes the completion
/// (the lease simply expires and another worker retries).
pub async fn apply_result(
    db: &SurrealDbClient,
    embedder: &dyn EmbeddingService,
    config: &AppConfig,
    job: &Job,
    result: &serde_json::Value,
) -> Result<(), AppError> {
    match job.job_type {
        JobType::DistillClaims => {
            let payload: DistillClaimsPayload =
                serde_json::from_value(job.payload.clone()).map_err(AppError::Serialization)?;
            let result: DistillResult = serde_json::from_value(result.clone()).map_err(AppError::Serialization)?;
            handle_distill_completed(db, embedder, config, &payload, &result).await
        }
        JobType::CompareClaims => {
            let payload: CompareClaimsPayload =
                serde_json::from_value(job.payload.clone()).map_err(AppError::Serialization)?;
            let result: CompareResult = serde_json::from_value(result.clone()).map_err(AppError::Serialization)?;
            handle_compare_completed(db, config, &payload, &result).await
        }
        JobType::ClassifyTopic => {
            let payload: ClassifyTopicPayload =
                serde_json::from_value(job.payload.clone()).map_err(AppError::Serialization)?;
            let result: ClassifyResult = serde_json::from_value(result.clone()).map_err(AppError::Serialization)?;
            handle_classify_completed(db, &payload, &result).await
        }
    }
}

async fn handle_distill_completed(
    db: &SurrealDbClient,
    embedder: &dyn EmbeddingService,
    config: &AppConfig,
    payload: &DistillClaimsPayload,
    result: &DistillResult,
) -> Result<(), AppError> {
    store_distilled_claims(db, &payload.entry_id, result).await?;

    db.client
        .query("UPDATE type::thing('entry', $id) SET claims_status = 'distilled'")
        .bind(("id", payload.entry_id.clone()))
        .await?;

    match embedder.embed(&payload.content).await {
        Ok(vector) => {
            db.client
                .query("UPDATE type::thing('entry', $id) SET embedding = $embedding")
                .bind(("id", payload.entry_id.clone()))
                .bind(("embedding", vector))
                .await?;
        }
        Err(err) => {
            warn!(entry_id = %payload.entry_id, %err, "embedding unavailable, entry left unembedded");
        }
    }

    let entry: Entry = db
        .get_item(&payload.entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entry {} not found", payload.entry_id)))?;

    let job_queue = JobQueue::new(db);

    let mut neighbors: Vec<Entry> = db
        .client
        .query(
            "SELECT * FROM entry WHERE notebook_id = $nb AND id != $id AND claims_status != 'pending' ORDER BY sequence DESC LIMIT $limit",
        )
        .bind(("nb", entry.notebook_id.clone()))
        .bind(("id", entry.id.clone()))
        .bind(("limit", config.compare_fanout as i64))
        .await?
        .take(0)?;
    neighbors.truncate(config.compare_fanout);

    for neighbor in &neighbors {
        let payload = serde_json::to_value(CompareClaimsPayload {
            entry_id: entry.id.clone(),
            peer_entry_id: neighbor.id.clone(),
        })
        .map_err(AppError::Serialization)?;
        job_queue
            .enqueue(&entry.notebook_id, JobType::CompareClaims, payload, config.default_max_attempts)
            .await?;
    }

    let classify_payload = serde_json::to_value(ClassifyTopicPayload {
        entry_id: entry.id.clone(),
        topic: entry.topic.clone(),
        content: entry.content.clone(),
    })
    .map_err(AppError::Serialization)?;
    job_queue
        .enqueue(&entry.notebook_id, JobType::ClassifyTopic, classify_payload, config.default_max_attempts)
        .await?;

    info!(entry_id = %entry.id, neighbors = neighbors.len(), "distill completion fanned out");
    Ok(())
}

async fn handle_compare_completed(
    db: &SurrealDbClient,
    config: &AppConfig,
    payload: &CompareClaimsPayload,
    result: &CompareResult,
) -> Result<(), AppError> {
    let comparison = derive_comparison(&payload.entry_id, &payload.peer_entry_id, result);
    upsert_comparison(db, &comparison).await?;

    let thresholds = thresholds(config);
    for entry_id in [&payload.entry_id, &payload.peer_entry_id] {
        let entry: Entry = db
            .get_item(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("entry {entry_id} not found")))?;
        let comparisons = comparisons_touching(db, entry_id).await?;
        recompute_and_persist(db, entry_id, entry.claims_status, &comparisons, thresholds).await?;
    }

    info!(entry_a = %payload.entry_id, entry_b = %payload.peer_entry_id, "comparison recorded");
    Ok(())
}

async fn handle_classify_completed(
    db: &SurrealDbClient,
    payload: &ClassifyTopicPayload,
    result: &ClassifyResult,
) -> Result<(), AppError> {
    let entry: Entry = db
        .get_item(&payload.entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("entry {} not found", payload.entry_id)))?;

    if entry.topic.is_empty() {
        let chosen = result
            .primary_topic
            .clone()
            .or_else(|| result.new_topic.clone())
            .unwrap_or_default();
        if !chosen.is_empty() {
            db.client
                .query("UPDATE type::thing('entry', $id) SET topic = $topic")
                .bind(("id", entry.id.clone()))
                .bind(("topic", chosen))
                .await?;
        }
    } else {
        let mut merged: HashSet<String> = entry.secondary_topics.iter().cloned().collect();
        merged.extend(result.secondary_topics.iter().cloned());
        if let Some(primary) = &result.primary_topic {
            if primary != &entry.topic {
                merged.insert(primary.clone());
            }
        }
        let mut merged: Vec<String> = merged.into_iter().collect();
        merged.sort();
        db.client
            .query("UPDATE type::thing('entry', $id) SET secondary_topics = $topics")
            .bind(("id", entry.id.clone()))
            .bind(("topics", merged))
            .await?;
    }

    Ok(())
}

/// Current claims for an entry, exposed for retrieval's entry-detail and claims-batch
/// operations without re-opening the claim storage module from outside this crate.
pub async fn claims_of(db: &SurrealDbClient, entry_id: &str) -> Result<Vec<common::storage::types::claim::Claim>, AppError> {
    claims_for_entry(db, entry_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::entry::IntegrationStatus;
    use common::storage::types::job::{Classification, ClassificationType, DistilledClaim};
    use common::utils::embedding::HashedEmbeddingService;
    use job_queue::JobQueue;
    use notebook_store::NotebookManager;

    async fn test_db() -> SurrealDbClient {
        let db = SurrealDbClient::memory("test", &uuid::Uuid::new_v4().to_string())
            .await
            .unwrap();
        db.ensure_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn distill_completion_fans_out_compare_and_classify_jobs() {
        let db = test_db().await;
        let manager = NotebookManager::new();
        let notebook = manager.create(&db, "n".into(), "alice".into()).await.unwrap();

        let inputs = vec![
            common::storage::types::entry::EntryInput {
                content: "Earth is round".into(),
                content_type: "text/plain".into(),
                topic: "astro".into(),
                references: vec![],
                revision_of: None,
                fragment_of: None,
                fragment_index: None,
            },
            common::storage::types::entry::EntryInput {
                content: "Mars has dust storms".into(),
                content_type: "text/plain".into(),
                topic: "astro".into(),
                references: vec![],
                revision_of: None,
                fragment_of: None,
                fragment_index: None,
            },
        ];
        let results = manager
            .write_batch(&db, &notebook.id, "alice", inputs, "alice".into(), 5)
            .await
            .unwrap();

        // mark the second entry distilled so the first has a neighbor to compare against
        db.client
            .query("UPDATE type::thing('entry', $id) SET claims_status = 'distilled'")
            .bind(("id", results[1].entry_id.clone()))
            .await
            .unwrap();

        let config = AppConfig {
            compare_fanout: 20,
            ..test_config()
        };
        let embedder = HashedEmbeddingService::new(16);

        let job_queue = JobQueue::new(&db);
        let job = job_queue
            .lease_next(&notebook.id, "worker-1", Some(JobType::DistillClaims), 60)
            .await
            .unwrap()
            .expect("distill job should be queued for first entry");

        let distill_result = DistillResult {
            claims: vec![DistilledClaim {
                text: "Earth is round".into(),
                confidence: 0.95,
            }],
        };
        apply_result(
            &db,
            &embedder,
            &config,
            &job,
            &serde_json::to_value(&distill_result).unwrap(),
        )
        .await
        .unwrap();

        let stats = job_queue.stats(&notebook.id).await.unwrap();
        let compare_pending = stats.get(&(JobType::CompareClaims, common::storage::types::job::JobStatus::Pending));
        assert_eq!(compare_pending, Some(&1));
        let classify_pending = stats.get(&(JobType::ClassifyTopic, common::storage::types::job::JobStatus::Pending));
        assert_eq!(classify_pending, Some(&1));
    }

    #[tokio::test]
    async fn compare_completion_marks_both_entries_contested() {
        let db = test_db().await;
        let manager = NotebookManager::new();
        let notebook = manager.create(&db, "n".into(), "alice".into()).await.unwrap();

        let inputs = vec![
            common::storage::types::entry::EntryInput {
                content: "Earth is round".into(),
                content_type: "text/plain".into(),
                topic: "astro".into(),
                references: vec![],
                revision_of: None,
                fragment_of: None,
                fragment_index: None,
            },
            common::storage::types::entry::EntryInput {
                content: "Earth is flat".into(),
                content_type: "text/plain".into(),
                topic: "astro".into(),
                references: vec![],
                revision_of: None,
                fragment_of: None,
                fragment_index: None,
            },
        ];
        let results = manager
            .write_batch(&db, &notebook.id, "alice", inputs, "alice".into(), 5)
            .await
            .unwrap();

        let payload = CompareClaimsPayload {
            entry_id: results[0].entry_id.clone(),
            peer_entry_id: results[1].entry_id.clone(),
        };
        let compare_result = CompareResult {
            classifications: vec![Classification {
                new_claim: "Earth is flat".into(),
                kind: ClassificationType::Contradicts,
                peer_claim: Some("Earth is round".into()),
                severity: Some(0.9),
            }],
        };

        handle_compare_completed(&db, &test_config(), &payload, &compare_result)
            .await
            .unwrap();

        let e1: Entry = db.get_item(&results[0].entry_id).await.unwrap().unwrap();
        let e2: Entry = db.get_item(&results[1].entry_id).await.unwrap().unwrap();
        assert_eq!(e1.integration_status, IntegrationStatus::Contested);
        assert_eq!(e2.integration_status, IntegrationStatus::Contested);
    }

    fn test_config() -> AppConfig {
        AppConfig {
            surrealdb_address: "mem://".into(),
            surrealdb_namespace: "test".into(),
            surrealdb_database: "test".into(),
            http_port: 0,
            lease_ttl_seconds: 60,
            default_max_attempts: 5,
            compare_fanout: 20,
            review_threshold: 0.2,
            contested_threshold: 0.5,
            integrated_threshold: 0.2,
            min_comparisons: 1,
            min_similarity: 0.3,
            rrf_k: 60,
            request_deadline_seconds: 30,
        }
    }
}
