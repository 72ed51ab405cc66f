//! Batched claims lookup (F, §4.6): `claims_batch(entry_ids, cap 100)` — one query fan-out
//! per entry rather than N+1 round trips through the API layer, used both by the
//! `/claims/batch` route and by `related` to enrich neighbors.
use std::collections::HashMap;

use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::claim::Claim;
use common::storage::types::entry::{ClaimsStatus, IntegrationStatus};
use futures::future::try_join_all;
use serde::Serialize;

use notebook_store::EntryStore;

pub const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct EntryClaimsSummary {
    pub id: String,
    pub topic: String,
    pub claims: Vec<Claim>,
    pub claims_status: ClaimsStatus,
    pub integration_status: IntegrationStatus,
}

pub async fn claims_batch(
    db: &SurrealDbClient,
    entries: &EntryStore,
    entry_ids: &[String],
) -> Result<Vec<EntryClaimsSummary>, AppError> {
    let capped = &entry_ids[..entry_ids.len().min(MAX_BATCH)];
    let summaries = try_join_all(capped.iter().map(|id| async move {
        let Some(entry) = entries.read(db, id).await? else {
            return Ok::<Option<EntryClaimsSummary>, AppError>(None);
        };
        let claims = claim_graph::claims::claims_for_entry(db, id).await?;
        Ok(Some(EntryClaimsSummary {
            id: entry.id,
            topic: entry.topic,
            claims,
            claims_status: entry.claims_status,
            integration_status: entry.integration_status,
        }))
    }))
    .await?;
    Ok(summaries.into_iter().flatten().collect())
}

/// Lower-level variant keyed by entry id, used where only the claim list (not the full
/// summary) is needed — e.g. enriching `related` results with a claim count.
pub async fn claims_map(db: &SurrealDbClient, entry_ids: &[String]) -> Result<HashMap<String, Vec<Claim>>, AppError> {
    let capped = &entry_ids[..entry_ids.len().min(MAX_BATCH)];
    let pairs = try_join_all(capped.iter().map(|id| async move {
        let claims = claim_graph::claims::claims_for_entry(db, id).await?;
        Ok::<(String, Vec<Claim>), AppError>((id.clone(), claims))
    }))
    .await?;
    Ok(pairs.into_iter().collect())
}
