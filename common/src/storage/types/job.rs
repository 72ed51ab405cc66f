use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::db::StoredObject;

use super::surreal_compat::{deserialize_datetime, deserialize_flexible_id, serialize_datetime};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    DistillClaims,
    CompareClaims,
    ClassifyTopic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A durable unit of background work with lease-based at-least-once delivery (§4.3).
/// `lease_expires_at` is persisted (not just held in memory) so crash recovery survives a
/// server restart — §9 open question (c).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub notebook_id: String,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    pub lease_expires_at: DateTime<Utc>,
    pub worker_id: Option<String>,
    pub last_error: Option<String>,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    pub created_at: DateTime<Utc>,
}

impl StoredObject for Job {
    fn table_name() -> &'static str {
        "job"
    }
    fn get_id(&self) -> &str {
        &self.id
    }
}

impl Job {
    pub fn new(
        notebook_id: String,
        job_type: JobType,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            notebook_id,
            job_type,
            payload,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts,
            lease_expires_at: now,
            worker_id: None,
            last_error: None,
            created_at: now,
        }
    }
}

// -- Typed payloads, one per job_type (§9 design notes: validate on deserialization,
// reject unknown fields). `Job::payload` stores the generic `serde_json::Value`; these
// types are the contract enqueue/consume sides agree on.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistillClaimsPayload {
    pub entry_id: String,
    pub content: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareClaimsPayload {
    pub entry_id: String,
    pub peer_entry_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyTopicPayload {
    pub entry_id: String,
    pub topic: String,
    pub content: String,
}

// -- Typed LLM result schemas (§9 design notes, frozen wire contracts).

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistilledClaim {
    pub text: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistillResult {
    pub claims: Vec<DistilledClaim>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationType {
    Novel,
    Redundant,
    Contradicts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    pub new_claim: String,
    #[serde(rename = "type")]
    pub kind: ClassificationType,
    #[serde(default)]
    pub peer_claim: Option<String>,
    #[serde(default)]
    pub severity: Option<f32>,
}

/// Raw LLM compare output (§9). `entropy`/`friction`/`contradictions` from §4.3's result
/// handler contract are *derived* from this — see `claim-graph::comparisons::derive_comparison`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompareResult {
    pub classifications: Vec<Classification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyResult {
    #[serde(default)]
    pub primary_topic: Option<String>,
    #[serde(default)]
    pub secondary_topics: Vec<String>,
    #[serde(default)]
    pub new_topic: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distill_result_rejects_unknown_fields() {
        let raw = serde_json::json!({
            "claims": [{"text": "Earth is round", "confidence": 0.95}],
            "unexpected": true
        });
        let result: Result<DistillResult, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }

    #[test]
    fn compare_result_parses_classifications() {
        let raw = serde_json::json!({
            "classifications": [
                {"new_claim": "Earth is flat", "type": "CONTRADICTS", "peer_claim": "Earth is round", "severity": 0.9}
            ]
        });
        let result: CompareResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.classifications.len(), 1);
        assert_eq!(result.classifications[0].kind, ClassificationType::Contradicts);
    }
}
