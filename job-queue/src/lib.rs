//! Durable, at-least-once, leased job queue (§4.3). This crate is a pure queue primitive:
//! it knows how to enqueue, lease, complete and fail `Job` rows, but it never interprets a
//! job's payload or result — that dispatch (DISTILL_CLAIMS -> claim-graph, etc.) is the
//! caller's job, because otherwise this crate would have to depend on every downstream
//! component it's supposed to stay underneath.
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::job::{Job, JobStatus, JobType};
use tracing::{info, warn};

pub struct JobQueue<'a> {
    db: &'a SurrealDbClient,
}

impl<'a> JobQueue<'a> {
    pub fn new(db: &'a SurrealDbClient) -> Self {
        Self { db }
    }

    pub async fn enqueue(
        &self,
        notebook_id: &str,
        job_type: JobType,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Result<Job, AppError> {
        let job = Job::new(notebook_id.to_string(), job_type, payload, max_attempts);
        let stored: Option<Job> = self.db.store_item(job.clone()).await?;
        info!(notebook_id, job_id = %job.id, job_type = ?job_type, "job enqueued");
        Ok(stored.unwrap_or(job))
    }

    /// Atomically picks one eligible job (pending, or in-progress with an expired lease),
    /// FIFO on `created_at` tiebroken by `id`, and leases it to `worker_id`. A single
    /// UPDATE statement with WHERE + ORDER BY + LIMIT 1 is SurrealDB's atomic compare-and-set
    /// here — no separate select-then-update race window.
    pub async fn lease_next(
        &self,
        notebook_id: &str,
        worker_id: &str,
        job_type: Option<JobType>,
        lease_ttl_seconds: i64,
    ) -> Result<Option<Job>, AppError> {
        let now = Utc::now();
        let lease_expires_at = now + Duration::seconds(lease_ttl_seconds);
        let job_type_filter = job_type.map(|t| serde_json::to_value(t).unwrap_or_default());

        let sql = "
            UPDATE job SET
                status = 'in_progress',
                attempts += 1,
                worker_id = $worker_id,
                lease_expires_at = $lease_expires_at
            WHERE notebook_id = $notebook_id
              AND (status = 'pending' OR (status = 'in_progress' AND lease_expires_at < $now))
              AND ($job_type = NONE OR job_type = $job_type)
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            RETURN AFTER;
        ";

        let mut response = self
            .db
            .client
            .query(sql)
            .bind(("notebook_id", notebook_id.to_string()))
            .bind(("worker_id", worker_id.to_string()))
            .bind(("lease_expires_at", lease_expires_at))
            .bind(("now", now))
            .bind(("job_type", job_type_filter))
            .await?;

        let leased: Vec<Job> = response.take(0)?;
        if let Some(job) = leased.into_iter().next() {
            info!(notebook_id, job_id = %job.id, worker_id, attempts = job.attempts, "job leased");
            Ok(Some(job))
        } else {
            Ok(None)
        }
    }

    /// Marks a job completed. The caller is responsible for applying `result` to the
    /// downstream components *before or after* calling this — the contract only requires
    /// that the first successful `complete` call's result be the durable one, and that a
    /// second `complete` call (stale lease) never succeeds.
    pub async fn complete(&self, job_id: &str, worker_id: &str) -> Result<Job, AppError> {
        self.transition_leased(job_id, worker_id, JobStatus::Completed, None)
            .await
    }

    pub async fn fail(&self, job_id: &str, worker_id: &str, error: String) -> Result<Job, AppError> {
        let existing: Job = self
            .db
            .get_item(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;

        if existing.worker_id.as_deref() != Some(worker_id) || existing.status != JobStatus::InProgress {
            return Err(AppError::Conflict(format!(
                "job {job_id} is not leased by {worker_id}"
            )));
        }

        let retryable = existing.attempts < existing.max_attempts;
        let sql = if retryable {
            "UPDATE type::thing('job', $id) SET status = 'pending', worker_id = NONE, last_error = $error RETURN AFTER;"
        } else {
            "UPDATE type::thing('job', $id) SET status = 'failed', last_error = $error RETURN AFTER;"
        };

        let mut response = self
            .db
            .client
            .query(sql)
            .bind(("id", job_id.to_string()))
            .bind(("error", error.clone()))
            .await?;
        let updated: Option<Job> = response.take(0)?;
        let job = updated.ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;

        if retryable {
            warn!(job_id, attempts = job.attempts, max_attempts = job.max_attempts, %error, "job failed, will retry");
        } else {
            warn!(job_id, attempts = job.attempts, %error, "job failed permanently");
        }
        Ok(job)
    }

    async fn transition_leased(
        &self,
        job_id: &str,
        worker_id: &str,
        status: JobStatus,
        last_error: Option<String>,
    ) -> Result<Job, AppError> {
        let existing: Job = self
            .db
            .get_item(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;

        if existing.worker_id.as_deref() != Some(worker_id) || existing.status != JobStatus::InProgress {
            return Err(AppError::Conflict(format!(
                "job {job_id} is not leased by {worker_id}"
            )));
        }

        let mut response = self
            .db
            .client
            .query("UPDATE type::thing('job', $id) SET status = $status, last_error = $error RETURN AFTER;")
            .bind(("id", job_id.to_string()))
            .bind(("status", status))
            .bind(("error", last_error))
            .await?;
        let updated: Option<Job> = response.take(0)?;
        let job = updated.ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
        info!(job_id, status = ?job.status, "job transitioned");
        Ok(job)
    }

    pub async fn stats(
        &self,
        notebook_id: &str,
    ) -> Result<HashMap<(JobType, JobStatus), u64>, AppError> {
        let jobs: Vec<Job> = self
            .db
            .client
            .query("SELECT * FROM job WHERE notebook_id = $notebook_id")
            .bind(("notebook_id", notebook_id.to_string()))
            .await?
            .take(0)?;

        let mut counts: HashMap<(JobType, JobStatus), u64> = HashMap::new();
        for job in jobs {
            *counts.entry((job.job_type, job.status)).or_insert(0) += 1;
        }
        Ok(counts)
    }

    pub async fn get(&self, job_id: &str) -> Result<Option<Job>, AppError> {
        self.db.get_item(job_id).await
    }
}

/// True once a job's lease has expired and it's eligible for re-lease (§4.3/§5).
pub fn lease_expired(job: &Job, now: DateTime<Utc>) -> bool {
    job.status == JobStatus::InProgress && job.lease_expires_at < now
}
