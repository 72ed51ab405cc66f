//! Hybrid search (F, §4.6): semantic and lexical run independently to `top_k·2`, fused by
//! reciprocal rank fusion at `k=60`. If exactly one mode fails it degrades to the
//! surviving mode with a note; if both fail the caller sees the error.
use std::collections::HashMap;

use common::error::AppError;
use common::storage::db::SurrealDbClient;
use common::utils::embedding::EmbeddingService;
use serde::Serialize;

use notebook_store::EntryStore;

use crate::lexical::{lexical_search, SearchIn};
use crate::semantic::semantic_search;

#[derive(Debug, Clone, Serialize)]
pub struct HybridResult {
    pub entry_id: String,
    pub fused_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HybridResponse {
    pub results: Vec<HybridResult>,
    /// Set when one retrieval mode failed and the other carried the response alone.
    pub note: Option<String>,
}

pub async fn hybrid_search(
    db: &SurrealDbClient,
    entries: &EntryStore,
    embedder: &dyn EmbeddingService,
    notebook_id: &str,
    query: &str,
    top_k: usize,
    min_similarity: f32,
    rrf_k: u32,
) -> Result<HybridResponse, AppError> {
    let fetch = top_k.saturating_mul(2).max(top_k);

    let semantic = semantic_search(db, entries, embedder, notebook_id, query, fetch, min_similarity).await;
    let lexical = lexical_search(db, entries, notebook_id, query, SearchIn::Both, fetch).await;

    match (semantic, lexical) {
        (Ok(semantic), Ok(lexical)) => {
            let semantic_ranks: Vec<String> = semantic.into_iter().map(|r| r.entry_id).collect();
            let lexical_ranks: Vec<String> = lexical.into_iter().map(|r| r.entry_id).collect();
            let fused = fuse(&[semantic_ranks, lexical_ranks], rrf_k);
            Ok(HybridResponse {
                results: top(fused, top_k),
                note: None,
            })
        }
        (Ok(semantic), Err(lexical_err)) => {
            let ranks: Vec<String> = semantic.into_iter().map(|r| r.entry_id).collect();
            let fused = fuse(&[ranks], rrf_k);
            Ok(HybridResponse {
                results: top(fused, top_k),
                note: Some(format!("lexical search unavailable: {lexical_err}")),
            })
        }
        (Err(semantic_err), Ok(lexical)) => {
            let ranks: Vec<String> = lexical.into_iter().map(|r| r.entry_id).collect();
            let fused = fuse(&[ranks], rrf_k);
            Ok(HybridResponse {
                results: top(fused, top_k),
                note: Some(format!("semantic search unavailable: {semantic_err}")),
            })
        }
        (Err(semantic_err), Err(_lexical_err)) => Err(semantic_err),
    }
}

/// `score(e) = Σ_modes 1/(k + rank_mode(e))`, rank 0-based per mode's own ordering.
fn fuse(mode_rankings: &[Vec<String>], k: u32) -> HashMap<String, f32> {
    let mut scores: HashMap<String, f32> = HashMap::new();
    for ranking in mode_rankings {
        for (rank, entry_id) in ranking.iter().enumerate() {
            let contribution = 1.0 / (k as f32 + rank as f32 + 1.0);
            *scores.entry(entry_id.clone()).or_insert(0.0) += contribution;
        }
    }
    scores
}

fn top(scores: HashMap<String, f32>, top_k: usize) -> Vec<HybridResult> {
    let mut results: Vec<HybridResult> = scores
        .into_iter()
        .map(|(entry_id, fused_score)| HybridResult { entry_id, fused_score })
        .collect();
    results.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entry_id.cmp(&b.entry_id))
    });
    results.truncate(top_k);
    results
}
