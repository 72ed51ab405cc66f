//! The embedding service is an external collaborator (§1, §6): the core only needs
//! something that turns text into a fixed-dimension vector and can be swapped for a real
//! model behind an RPC. `EmbeddingService` is the seam; `HashedEmbeddingService` is a
//! deterministic, dependency-free default suitable for tests and single-operator
//! deployments without a model server, mirroring the teacher's `EmbeddingProvider::new_hashed`.
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::error::AppError;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Notebook-wide constant dimension `D` the contract in §6 requires.
    fn dimension(&self) -> usize;

    /// Embeds `text`. Callers treat any error as `AppError::DependencyUnavailable` so
    /// retrieval can degrade per §4.6/§7.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

/// Deterministic bag-of-hashed-tokens embedding. Not semantically meaningful beyond
/// rewarding shared vocabulary, but gives cosine similarity a stable, dependency-free
/// implementation to exercise semantic search and hybrid RRF in tests.
pub struct HashedEmbeddingService {
    dimension: usize,
}

impl HashedEmbeddingService {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingService for HashedEmbeddingService {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimension;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// An unavailable embedding service, for exercising the §4.6/§7 degraded-search paths.
pub struct UnavailableEmbeddingService;

#[async_trait]
impl EmbeddingService for UnavailableEmbeddingService {
    fn dimension(&self) -> usize {
        0
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        Err(AppError::DependencyUnavailable("embedding service unavailable".into()))
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashed_embeddings_are_deterministic() {
        let svc = HashedEmbeddingService::new(32);
        let a = svc.embed("earth is round").await.unwrap();
        let b = svc.embed("earth is round").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn similar_text_scores_higher_than_unrelated_text() {
        let svc = HashedEmbeddingService::new(64);
        let query = svc.embed("astro physics black holes").await.unwrap();
        let near = svc.embed("astro physics neutron stars").await.unwrap();
        let far = svc.embed("pasta recipes and cooking tips").await.unwrap();
        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[tokio::test]
    async fn unavailable_service_errors() {
        let svc = UnavailableEmbeddingService;
        assert!(svc.embed("anything").await.is_err());
    }
}
