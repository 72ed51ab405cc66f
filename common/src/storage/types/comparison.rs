use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::db::StoredObject;

use super::surreal_compat::deserialize_flexible_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub claim_a_text: String,
    pub claim_b_text: String,
    pub severity: f32,
}

/// A pairwise relation between two entries. Unordered in meaning, but stored at a
/// canonical key so "at most one comparison per unordered pair" (§3) is enforceable by a
/// unique index rather than an application-level scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(deserialize_with = "deserialize_flexible_id")]
    pub id: String,
    pub entry_a: String,
    pub entry_b: String,
    pub entropy: f32,
    pub friction: f32,
    pub contradictions: Vec<Contradiction>,
}

impl StoredObject for Comparison {
    fn table_name() -> &'static str {
        "comparison"
    }
    fn get_id(&self) -> &str {
        &self.id
    }
}

impl Comparison {
    /// Canonical key for an unordered pair: `(min(a,b), max(a,b))`.
    pub fn pair_key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn new(
        entry_a: &str,
        entry_b: &str,
        entropy: f32,
        friction: f32,
        contradictions: Vec<Contradiction>,
    ) -> Self {
        let (a, b) = Self::pair_key(entry_a, entry_b);
        Self {
            id: Uuid::new_v4().to_string(),
            entry_a: a,
            entry_b: b,
            entropy: entropy.clamp(0.0, 1.0),
            friction: friction.clamp(0.0, 1.0),
            contradictions,
        }
    }

    /// Given the entry this comparison is being viewed from, the id of the other side.
    pub fn other(&self, entry_id: &str) -> Option<&str> {
        if self.entry_a == entry_id {
            Some(&self.entry_b)
        } else if self.entry_b == entry_id {
            Some(&self.entry_a)
        } else {
            None
        }
    }

    pub fn touches(&self, entry_id: &str) -> bool {
        self.entry_a == entry_id || self.entry_b == entry_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(Comparison::pair_key("a", "b"), Comparison::pair_key("b", "a"));
    }
}
