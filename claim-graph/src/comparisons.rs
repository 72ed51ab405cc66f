//! Comparison storage and derivation (E, §4.4). The worker's raw result is a set of
//! per-claim classifications (§9); `derive_comparison` turns that into the
//! entropy/friction/contradictions triple the result-handler contract in §4.3 promises.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::comparison::{Comparison, Contradiction};
use common::storage::types::job::{ClassificationType, CompareResult};

/// Entropy is the fraction of classifications judged NOVEL, friction the fraction judged
/// CONTRADICTS (GLOSSARY). An empty classification set carries no signal either way.
pub fn derive_comparison(entry_a: &str, entry_b: &str, result: &CompareResult) -> Comparison {
    let total = result.classifications.len();
    let (novel, contradicts) = if total == 0 {
        (0usize, 0usize)
    } else {
        let novel = result
            .classifications
            .iter()
            .filter(|c| c.kind == ClassificationType::Novel)
            .count();
        let contradicts = result
            .classifications
            .iter()
            .filter(|c| c.kind == ClassificationType::Contradicts)
            .count();
        (novel, contradicts)
    };

    let entropy = if total == 0 { 0.0 } else { novel as f32 / total as f32 };
    let friction = if total == 0 { 0.0 } else { contradicts as f32 / total as f32 };

    let contradictions = result
        .classifications
        .iter()
        .filter(|c| c.kind == ClassificationType::Contradicts)
        .map(|c| Contradiction {
            claim_a_text: c.new_claim.clone(),
            claim_b_text: c.peer_claim.clone().unwrap_or_default(),
            severity: c.severity.unwrap_or(0.0).clamp(0.0, 1.0),
        })
        .collect();

    Comparison::new(entry_a, entry_b, entropy, friction, contradictions)
}

/// Upserts by the canonical unordered-pair key (§3/§8: "exactly one Comparison row exists
/// per unordered pair"). Re-delivery of the same COMPARE_CLAIMS completion overwrites the
/// prior row rather than duplicating it.
pub async fn upsert_comparison(db: &SurrealDbClient, comparison: &Comparison) -> Result<Comparison, AppError> {
    let existing: Vec<Comparison> = db
        .client
        .query("SELECT * FROM comparison WHERE entry_a = $a AND entry_b = $b")
        .bind(("a", comparison.entry_a.clone()))
        .bind(("b", comparison.entry_b.clone()))
        .await?
        .take(0)?;

    if let Some(prior) = existing.into_iter().next() {
        let mut response = db
            .client
            .query(
                "UPDATE type::thing('comparison', $id) SET entropy = $entropy, friction = $friction, contradictions = $contradictions RETURN AFTER;",
            )
            .bind(("id", prior.id.clone()))
            .bind(("entropy", comparison.entropy))
            .bind(("friction", comparison.friction))
            .bind(("contradictions", comparison.contradictions.clone()))
            .await?;
        let updated: Option<Comparison> = response.take(0)?;
        Ok(updated.unwrap_or(prior))
    } else {
        let stored: Option<Comparison> = db.store_item(comparison.clone()).await?;
        Ok(stored.unwrap_or_else(|| comparison.clone()))
    }
}

pub async fn comparisons_touching(db: &SurrealDbClient, entry_id: &str) -> Result<Vec<Comparison>, AppError> {
    Ok(db
        .client
        .query("SELECT * FROM comparison WHERE entry_a = $id OR entry_b = $id")
        .bind(("id", entry_id.to_string()))
        .await?
        .take(0)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::job::Classification;

    fn classification(kind: ClassificationType, severity: Option<f32>) -> Classification {
        Classification {
            new_claim: "Earth is flat".into(),
            kind,
            peer_claim: Some("Earth is round".into()),
            severity,
        }
    }

    #[test]
    fn full_contradiction_yields_friction_one() {
        let result = CompareResult {
            classifications: vec![classification(ClassificationType::Contradicts, Some(0.9))],
        };
        let cmp = derive_comparison("e1", "e2", &result);
        assert_eq!(cmp.friction, 1.0);
        assert_eq!(cmp.entropy, 0.0);
        assert_eq!(cmp.contradictions.len(), 1);
        assert_eq!(cmp.contradictions[0].severity, 0.9);
    }

    #[test]
    fn mixed_classifications_produce_fractional_scores() {
        let result = CompareResult {
            classifications: vec![
                classification(ClassificationType::Novel, None),
                classification(ClassificationType::Redundant, None),
                classification(ClassificationType::Contradicts, Some(0.5)),
                classification(ClassificationType::Contradicts, Some(0.5)),
            ],
        };
        let cmp = derive_comparison("e1", "e2", &result);
        assert_eq!(cmp.entropy, 0.25);
        assert_eq!(cmp.friction, 0.5);
    }

    #[test]
    fn empty_classifications_yield_zero_signal() {
        let result = CompareResult { classifications: vec![] };
        let cmp = derive_comparison("e1", "e2", &result);
        assert_eq!(cmp.entropy, 0.0);
        assert_eq!(cmp.friction, 0.0);
    }
}
