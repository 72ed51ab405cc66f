use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::db::StoredObject;

use super::integration_cost::IntegrationCost;
use super::surreal_compat::{deserialize_datetime, deserialize_flexible_id, serialize_datetime};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ClaimsStatus {
    Pending,
    Distilled,
    Verified,
}

impl ClaimsStatus {
    /// `claims_status` only ever moves forward: pending -> distilled -> verified (§3).
    pub fn can_advance_to(self, next: Self) -> bool {
        next >= self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Probation,
    Integrated,
    Contested,
}

/// An append-only unit of content in a notebook. Content itself is immutable; only the
/// enrichment fields (`claims_status`, `integration_status`, `max_friction`) are mutated
/// in place by the pipeline, never `content`/`references`/`revision_of`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub notebook_id: String,
    pub content: String,
    pub content_type: String,
    pub topic: String,
    pub references: Vec<String>,
    pub revision_of: Option<String>,
    pub fragment_of: Option<String>,
    pub fragment_index: Option<u32>,
    pub author: String,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    pub created_at: DateTime<Utc>,
    pub sequence: u64,
    pub integration_cost: IntegrationCost,
    pub claims_status: ClaimsStatus,
    pub integration_status: IntegrationStatus,
    pub max_friction: f32,
    /// Populated once DISTILL_CLAIMS completes (§6 embedding service contract); `None`
    /// until then, or permanently if the embedding service was unavailable.
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    /// CLASSIFY_TOPIC results that arrived after `topic` was already non-empty (§4.3:
    /// "otherwise record but do not overwrite").
    #[serde(default)]
    pub secondary_topics: Vec<String>,
}

impl StoredObject for Entry {
    fn table_name() -> &'static str {
        "entry"
    }
    fn get_id(&self) -> &str {
        &self.id
    }
}

/// Fields a caller supplies for one entry in a write batch; the store fills in the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInput {
    pub content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub revision_of: Option<String>,
    #[serde(default)]
    pub fragment_of: Option<String>,
    #[serde(default)]
    pub fragment_index: Option<u32>,
}

fn default_content_type() -> String {
    "text/plain".to_string()
}

/// Outcome of writing one entry within a batch (§4.1 write protocol).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
    pub entry_id: String,
    pub sequence: u64,
    pub integration_cost: IntegrationCost,
}

impl Entry {
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}
