use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::db::StoredObject;

use super::surreal_compat::deserialize_flexible_id;

/// An LLM-distilled factual sentence extracted from an entry. `ordinal` is semantically
/// meaningful — most central claim first — and claims are created once by job completion,
/// never edited afterwards (§3 lifecycles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub entry_id: String,
    pub ordinal: u32,
    pub text: String,
    pub confidence: f32,
}

impl StoredObject for Claim {
    fn table_name() -> &'static str {
        "claim"
    }
    fn get_id(&self) -> &str {
        &self.id
    }
}

impl Claim {
    pub fn new(entry_id: String, ordinal: u32, text: String, confidence: f32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry_id,
            ordinal,
            text,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
