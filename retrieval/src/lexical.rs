//! Lexical search (F, §4.6): character-trigram Jaccard similarity over content, claims,
//! or both. Implemented in-process rather than delegated to a store-side full-text index
//! so scores stay deterministic and the rank-stability property in §8 holds regardless of
//! which FTS engine the deployment happens to run (SPEC_FULL §4.6).
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::storage::types::entry::Entry;
use common::utils::tokenize::trigram_similarity;
use serde::{Deserialize, Serialize};

use notebook_store::EntryStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchIn {
    Content,
    Claims,
    Both,
}

#[derive(Debug, Clone, Serialize)]
pub struct LexicalResult {
    pub entry_id: String,
    pub snippet: String,
    pub score: f32,
}

const SNIPPET_CHARS: usize = 200;

pub async fn lexical_search(
    db: &SurrealDbClient,
    entries: &EntryStore,
    notebook_id: &str,
    query: &str,
    search_in: SearchIn,
    max_results: usize,
) -> Result<Vec<LexicalResult>, AppError> {
    let all = entries.list_all(db, notebook_id).await?;
    let mut results = Vec::with_capacity(all.len());

    for entry in &all {
        let score = match search_in {
            SearchIn::Content => trigram_similarity(query, &entry.content),
            SearchIn::Claims => score_against_claims(db, entry, query).await?,
            SearchIn::Both => {
                let content_score = trigram_similarity(query, &entry.content);
                let claims_score = score_against_claims(db, entry, query).await?;
                content_score.max(claims_score)
            }
        };
        if score > 0.0 {
            results.push(LexicalResult {
                entry_id: entry.id.clone(),
                snippet: entry.content.chars().take(SNIPPET_CHARS).collect(),
                score,
            });
        }
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(max_results);
    Ok(results)
}

async fn score_against_claims(db: &SurrealDbClient, entry: &Entry, query: &str) -> Result<f32, AppError> {
    let claims = claim_graph::claims::claims_for_entry(db, &entry.id).await?;
    Ok(claims
        .iter()
        .map(|c| trigram_similarity(query, &c.text))
        .fold(0.0_f32, f32::max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_overlap_scores_higher() {
        let high = trigram_similarity("astro physics", "astro physics is great");
        let low = trigram_similarity("astro physics", "completely unrelated subject");
        assert!(high > low);
    }
}
