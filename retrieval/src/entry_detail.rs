//! Entry detail assembly (F): the `GET /notebooks/{id}/entries/{eid}` response shape —
//! the entry itself plus its claims, touching comparisons, resolved references, and
//! revisions, gathered with one lookup apiece rather than making the caller chase each.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::claim::Claim;
use common::storage::types::comparison::Comparison;
use common::storage::types::entry::Entry;
use serde::Serialize;

use notebook_store::EntryStore;

#[derive(Debug, Clone, Serialize)]
pub struct EntryDetail {
    pub entry: Entry,
    pub claims: Vec<Claim>,
    pub comparisons: Vec<Comparison>,
    pub references: Vec<Entry>,
    pub revisions: Vec<Entry>,
}

pub async fn entry_detail(
    db: &SurrealDbClient,
    entries: &EntryStore,
    notebook_id: &str,
    entry_id: &str,
) -> Result<Option<EntryDetail>, AppError> {
    let Some(entry) = entries.read(db, entry_id).await? else {
        return Ok(None);
    };
    if entry.notebook_id != notebook_id {
        return Ok(None);
    }

    let claims = claim_graph::claims::claims_for_entry(db, entry_id).await?;
    let comparisons = claim_graph::comparisons::comparisons_touching(db, entry_id).await?;

    let mut references = Vec::with_capacity(entry.references.len());
    for reference_id in &entry.references {
        if let Some(referenced) = entries.read(db, reference_id).await? {
            references.push(referenced);
        }
    }

    let revisions = entries.revisions_of(db, notebook_id, entry_id).await?;

    Ok(Some(EntryDetail {
        entry,
        claims,
        comparisons,
        references,
        revisions,
    }))
}
