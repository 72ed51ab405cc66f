use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::db::StoredObject;

use super::surreal_compat::{deserialize_datetime, deserialize_flexible_id, serialize_datetime};

/// A single (entity, read, write) grant. `entity` is an opaque participant identity —
/// the bearer-token-to-identity mapping lives outside the core (see `TokenValidator`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub entity: String,
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub name: String,
    pub owner: String,
    pub participants: Vec<Participant>,
    #[serde(
        serialize_with = "serialize_datetime",
        deserialize_with = "deserialize_datetime",
        default
    )]
    pub created_at: DateTime<Utc>,
    pub sequence_counter: u64,
    /// Running `Σ entries_revised·0.3 + references_broken·0.5 + catalog_shift` over every
    /// write this notebook has ever accepted (SPEC_FULL §4.2): a diagnostic accumulator,
    /// not an invariant gate, mirroring the legacy bootstrap's `coherence.json` counter.
    #[serde(default)]
    pub total_entropy: f32,
}

impl StoredObject for Notebook {
    fn table_name() -> &'static str {
        "notebook"
    }
    fn get_id(&self) -> &str {
        &self.id
    }
}

impl Notebook {
    pub fn new(name: String, owner: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            owner: owner.clone(),
            participants: vec![Participant {
                entity: owner,
                read: true,
                write: true,
            }],
            created_at: Utc::now(),
            sequence_counter: 0,
            total_entropy: 0.0,
        }
    }

    pub fn can_read(&self, entity: &str) -> bool {
        entity == self.owner || self.participants.iter().any(|p| p.entity == entity && p.read)
    }

    pub fn can_write(&self, entity: &str) -> bool {
        entity == self.owner || self.participants.iter().any(|p| p.entity == entity && p.write)
    }

    pub fn is_participant(&self, entity: &str) -> bool {
        entity == self.owner || self.participants.iter().any(|p| p.entity == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_has_implicit_read_write() {
        let nb = Notebook::new("n".into(), "alice".into());
        assert!(nb.can_read("alice"));
        assert!(nb.can_write("alice"));
        assert!(!nb.can_read("bob"));
    }

    #[test]
    fn participant_without_write_cannot_write() {
        let mut nb = Notebook::new("n".into(), "alice".into());
        nb.participants.push(Participant {
            entity: "bob".into(),
            read: true,
            write: false,
        });
        assert!(nb.can_read("bob"));
        assert!(!nb.can_write("bob"));
    }
}
