//! Reference worker (§6.1): a runnable, deterministic consumer of the queue contract,
//! polling `/jobs/next` and completing jobs with the placeholder transforms in
//! `transform`. Any real LLM-backed worker implements the same three endpoints; this one
//! exists to prove the contract end-to-end, not to replace those out-of-scope workers.
mod transform;

use std::env;
use std::time::Duration;

use common::storage::types::entry::Entry;
use common::storage::types::job::{
    ClassifyTopicPayload, CompareClaimsPayload, DistillClaimsPayload, Job, JobType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

struct WorkerConfig {
    server_url: String,
    notebook_id: String,
    token: String,
    author: String,
    poll_interval: Duration,
}

impl WorkerConfig {
    fn from_env() -> Result<Self, String> {
        let server_url = env::var("SERVER_URL").map_err(|_| "SERVER_URL is not set".to_string())?;
        let notebook_id = env::var("NOTEBOOK_ID").map_err(|_| "NOTEBOOK_ID is not set".to_string())?;
        let token = env::var("TOKEN").map_err(|_| "TOKEN is not set".to_string())?;
        let author = env::var("AUTHOR").unwrap_or_else(|_| "notebook-worker".to_string());
        let poll_interval = env::var("POLL_INTERVAL")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5);
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            notebook_id,
            token,
            author,
            poll_interval: Duration::from_secs(poll_interval),
        })
    }
}

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    worker_id: &'a str,
    result: Value,
}

#[derive(Debug, Serialize)]
struct FailRequest<'a> {
    worker_id: &'a str,
    error: String,
}

#[derive(Debug, Deserialize)]
struct EntryDetailResponse {
    entry: Entry,
    claims: Vec<common::storage::types::claim::Claim>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "fatal configuration error");
            std::process::exit(1);
        }
    };

    let worker_id = format!("notebook-worker-{}", uuid::Uuid::new_v4());
    let client = reqwest::Client::new();

    info!(worker_id, notebook_id = %config.notebook_id, server = %config.server_url, author = %config.author, "worker starting");

    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        let poll = poll_and_process(&client, &config, &worker_id);
        tokio::select! {
            result = poll => {
                match result {
                    Ok(true) => continue,
                    Ok(false) => tokio::time::sleep(config.poll_interval).await,
                    Err(err) => {
                        error!(%err, "unrecoverable queue error");
                        std::process::exit(2);
                    }
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                std::process::exit(0);
            }
        }
    }
}

/// Leases and processes at most one job. Returns `Ok(true)` if a job was leased (poll
/// again immediately), `Ok(false)` if the queue was empty (sleep before polling again).
async fn poll_and_process(
    client: &reqwest::Client,
    config: &WorkerConfig,
    worker_id: &str,
) -> Result<bool, String> {
    let url = format!(
        "{}/api/v1/notebooks/{}/jobs/next?worker_id={}",
        config.server_url, config.notebook_id, worker_id
    );
    let response = client
        .get(&url)
        .bearer_auth(&config.token)
        .send()
        .await
        .map_err(|err| format!("lease request failed: {err}"))?;

    if response.status() == reqwest::StatusCode::NO_CONTENT {
        return Ok(false);
    }
    if !response.status().is_success() {
        return Err(format!("lease request returned {}", response.status()));
    }

    let job: Job = response
        .json()
        .await
        .map_err(|err| format!("failed to parse leased job: {err}"))?;

    match process_job(client, config, worker_id, &job).await {
        Ok(result) => {
            complete(client, config, worker_id, &job.id, result).await?;
        }
        Err(err) => {
            warn!(job_id = %job.id, %err, "job processing failed, reporting to queue");
            fail(client, config, worker_id, &job.id, err).await?;
        }
    }
    Ok(true)
}

async fn process_job(
    client: &reqwest::Client,
    config: &WorkerConfig,
    worker_id: &str,
    job: &Job,
) -> Result<Value, String> {
    match job.job_type {
        JobType::DistillClaims => {
            let payload: DistillClaimsPayload =
                serde_json::from_value(job.payload.clone()).map_err(|e| e.to_string())?;
            let result = transform::distill(&payload.content);
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        JobType::CompareClaims => {
            let payload: CompareClaimsPayload =
                serde_json::from_value(job.payload.clone()).map_err(|e| e.to_string())?;
            let entry_detail = fetch_entry_detail(client, config, worker_id, &payload.entry_id).await?;
            let peer_detail = fetch_entry_detail(client, config, worker_id, &payload.peer_entry_id).await?;
            let claims_a: Vec<String> = entry_detail.claims.into_iter().map(|c| c.text).collect();
            let claims_b: Vec<String> = peer_detail.claims.into_iter().map(|c| c.text).collect();
            let result = transform::compare(&claims_a, &claims_b);
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        JobType::ClassifyTopic => {
            let payload: ClassifyTopicPayload =
                serde_json::from_value(job.payload.clone()).map_err(|e| e.to_string())?;
            let result = transform::classify(&payload.topic, &payload.content);
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
    }
}

async fn fetch_entry_detail(
    client: &reqwest::Client,
    config: &WorkerConfig,
    _worker_id: &str,
    entry_id: &str,
) -> Result<EntryDetailResponse, String> {
    let url = format!(
        "{}/api/v1/notebooks/{}/entries/{}",
        config.server_url, config.notebook_id, entry_id
    );
    let response = client
        .get(&url)
        .bearer_auth(&config.token)
        .send()
        .await
        .map_err(|err| format!("entry detail request failed: {err}"))?;
    if !response.status().is_success() {
        return Err(format!("entry detail request returned {}", response.status()));
    }
    response
        .json()
        .await
        .map_err(|err| format!("failed to parse entry detail: {err}"))
}

async fn complete(
    client: &reqwest::Client,
    config: &WorkerConfig,
    worker_id: &str,
    job_id: &str,
    result: Value,
) -> Result<(), String> {
    let url = format!(
        "{}/api/v1/notebooks/{}/jobs/{}/complete",
        config.server_url, config.notebook_id, job_id
    );
    let response = client
        .post(&url)
        .bearer_auth(&config.token)
        .json(&CompleteRequest { worker_id, result })
        .send()
        .await
        .map_err(|err| format!("complete request failed: {err}"))?;
    if !response.status().is_success() {
        return Err(format!("complete request returned {}", response.status()));
    }
    info!(job_id, "job completed");
    Ok(())
}

async fn fail(
    client: &reqwest::Client,
    config: &WorkerConfig,
    worker_id: &str,
    job_id: &str,
    error: String,
) -> Result<(), String> {
    let url = format!(
        "{}/api/v1/notebooks/{}/jobs/{}/fail",
        config.server_url, config.notebook_id, job_id
    );
    let response = client
        .post(&url)
        .bearer_auth(&config.token)
        .json(&FailRequest { worker_id, error })
        .send()
        .await
        .map_err(|err| format!("fail request failed: {err}"))?;
    if !response.status().is_success() {
        return Err(format!("fail request returned {}", response.status()));
    }
    Ok(())
}
