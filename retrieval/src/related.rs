//! Related-by-friction traversal (F, §4.6): from one entry, follow its `Comparison` edges,
//! filtered by direction, sorted by `(-friction, -entropy)`, enriched with the neighbor's
//! topic/claims/integration_status via one batched claims lookup.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::IntegrationStatus;
use serde::{Deserialize, Serialize};

use notebook_store::EntryStore;

use crate::claims_batch::claims_map;

const CONTRADICTS_FRICTION_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelatedDirection {
    Similar,
    Contradicts,
    All,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedEntry {
    pub entry_id: String,
    pub topic: String,
    pub integration_status: IntegrationStatus,
    pub friction: f32,
    pub entropy: f32,
    pub claim_count: usize,
}

pub async fn related(
    db: &SurrealDbClient,
    entries: &EntryStore,
    entry_id: &str,
    direction: RelatedDirection,
    max_results: usize,
) -> Result<Vec<RelatedEntry>, AppError> {
    let comparisons = claim_graph::comparisons::comparisons_touching(db, entry_id).await?;

    let mut candidates: Vec<(String, f32, f32)> = comparisons
        .into_iter()
        .filter_map(|cmp| {
            let other = cmp.other(entry_id)?.to_string();
            let matches_direction = match direction {
                RelatedDirection::Similar => cmp.friction <= CONTRADICTS_FRICTION_THRESHOLD,
                RelatedDirection::Contradicts => cmp.friction > CONTRADICTS_FRICTION_THRESHOLD,
                RelatedDirection::All => true,
            };
            matches_direction.then_some((other, cmp.friction, cmp.entropy))
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
    });
    candidates.truncate(max_results);

    let neighbor_ids: Vec<String> = candidates.iter().map(|(id, _, _)| id.clone()).collect();
    let claims_by_entry = claims_map(db, &neighbor_ids).await?;

    let mut result = Vec::with_capacity(candidates.len());
    for (neighbor_id, friction, entropy) in candidates {
        let Some(entry) = entries.read(db, &neighbor_id).await? else {
            continue;
        };
        let claim_count = claims_by_entry.get(&neighbor_id).map(Vec::len).unwrap_or(0);
        result.push(RelatedEntry {
            entry_id: entry.id,
            topic: entry.topic,
            integration_status: entry.integration_status,
            friction,
            entropy,
            claim_count,
        });
    }
    Ok(result)
}
