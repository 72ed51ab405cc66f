//! Semantic search (F, §4.6): embeds the query through the embedding collaborator, ranks
//! entries by cosine similarity of their stored embedding, filters by `min_similarity`.
//! Entries without a stored embedding (DISTILL hasn't completed, or embedding failed) are
//! simply absent from the ranking rather than scored as zero.
use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::utils::embedding::{cosine_similarity, EmbeddingService};
use serde::Serialize;

use notebook_store::EntryStore;

#[derive(Debug, Clone, Serialize)]
pub struct SemanticResult {
    pub entry_id: String,
    pub score: f32,
}

pub async fn semantic_search(
    db: &SurrealDbClient,
    entries: &EntryStore,
    embedder: &dyn EmbeddingService,
    notebook_id: &str,
    query: &str,
    top_k: usize,
    min_similarity: f32,
) -> Result<Vec<SemanticResult>, AppError> {
    let query_vector = embedder.embed(query).await?;
    let all = entries.list_all(db, notebook_id).await?;

    let mut scored: Vec<SemanticResult> = all
        .into_iter()
        .filter_map(|entry| {
            let embedding = entry.embedding.as_ref()?;
            let score = cosine_similarity(&query_vector, embedding);
            (score >= min_similarity).then_some(SemanticResult {
                entry_id: entry.id,
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    Ok(scored)
}
