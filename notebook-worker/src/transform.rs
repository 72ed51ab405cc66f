//! Deterministic, non-LLM placeholder transforms (§6.1). A real worker replaces these
//! with actual model calls; this one exists to exercise the job contract end-to-end:
//! sentence-split distillation, bag-of-words comparison, frequency-based classification.
use std::collections::HashMap;

use common::storage::types::job::{
    Classification, ClassificationType, ClassifyResult, CompareResult, DistilledClaim, DistillResult,
};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "of", "in", "on", "and", "or", "to", "that",
    "this", "it", "as", "at", "by", "for", "with", "from", "but", "not", "no",
];

fn word_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn significant_tokens(text: &str) -> Vec<String> {
    word_tokens(text).into_iter().filter(|w| !STOPWORDS.contains(&w.as_str())).collect()
}

fn jaccard(a: &[String], b: &[String]) -> f32 {
    use std::collections::HashSet;
    let set_a: HashSet<&String> = a.iter().collect();
    let set_b: HashSet<&String> = b.iter().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

/// Splits content into sentences on `.`/`?`/`!`, one claim per non-trivial sentence.
/// Confidence is a crude function of sentence length — longer, more specific sentences
/// score higher, capped at 0.9 since this transform never "knows" anything for certain.
pub fn distill(content: &str) -> DistillResult {
    let claims = content
        .split(['.', '?', '!'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|sentence| {
            let word_count = word_tokens(sentence).len();
            let confidence = (0.4 + word_count as f32 * 0.05).min(0.9);
            DistilledClaim {
                text: sentence.to_string(),
                confidence,
            }
        })
        .collect();
    DistillResult { claims }
}

/// Classifies each of `claims_a` against the full claim set of `claims_b` by token-bag
/// overlap: near-identical wording is REDUNDANT, a negated counterpart is CONTRADICTS,
/// anything with no meaningful overlap is NOVEL.
pub fn compare(claims_a: &[String], claims_b: &[String]) -> CompareResult {
    let mut classifications = Vec::with_capacity(claims_a.len());
    for claim in claims_a {
        let tokens_a = significant_tokens(claim);
        let negated_a = word_tokens(claim).iter().any(|w| w == "not" || w == "no");

        let mut best: Option<(&String, f32, bool)> = None;
        for peer in claims_b {
            let tokens_b = significant_tokens(peer);
            let similarity = jaccard(&tokens_a, &tokens_b);
            let negated_b = word_tokens(peer).iter().any(|w| w == "not" || w == "no");
            if best.as_ref().map(|(_, s, _)| similarity > *s).unwrap_or(true) {
                best = Some((peer, similarity, negated_b));
            }
        }

        let Some((peer, similarity, negated_b)) = best else {
            classifications.push(Classification {
                new_claim: claim.clone(),
                kind: ClassificationType::Novel,
                peer_claim: None,
                severity: None,
            });
            continue;
        };

        if similarity >= 0.6 && negated_a == negated_b {
            classifications.push(Classification {
                new_claim: claim.clone(),
                kind: ClassificationType::Redundant,
                peer_claim: Some(peer.clone()),
                severity: None,
            });
        } else if similarity >= 0.3 && negated_a != negated_b {
            classifications.push(Classification {
                new_claim: claim.clone(),
                kind: ClassificationType::Contradicts,
                peer_claim: Some(peer.clone()),
                severity: Some(similarity.clamp(0.0, 1.0)),
            });
        } else {
            classifications.push(Classification {
                new_claim: claim.clone(),
                kind: ClassificationType::Novel,
                peer_claim: None,
                severity: None,
            });
        }
    }
    CompareResult { classifications }
}

/// Picks the most frequent non-stopword token in `content` as the primary topic; ties
/// break lexicographically so the result is deterministic.
pub fn classify(topic: &str, content: &str) -> ClassifyResult {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in significant_tokens(content) {
        *counts.entry(token).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let primary_topic = ranked.first().map(|(word, _)| word.clone());
    let secondary_topics = ranked.iter().skip(1).take(2).map(|(word, _)| word.clone()).collect();

    ClassifyResult {
        primary_topic: if topic.is_empty() { primary_topic.clone() } else { None },
        secondary_topics,
        new_topic: if topic.is_empty() { None } else { primary_topic },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distill_splits_on_sentence_boundaries() {
        let result = distill("Earth is round. Mars has dust storms.");
        assert_eq!(result.claims.len(), 2);
        assert_eq!(result.claims[0].text, "Earth is round");
    }

    #[test]
    fn compare_flags_negated_overlap_as_contradiction() {
        let result = compare(&["Earth is flat".to_string()], &["Earth is not flat".to_string()]);
        assert_eq!(result.classifications.len(), 1);
        assert_eq!(result.classifications[0].kind, ClassificationType::Contradicts);
    }

    #[test]
    fn compare_flags_unrelated_claim_as_novel() {
        let result = compare(&["rockets use liquid fuel".to_string()], &["pasta needs boiling water".to_string()]);
        assert_eq!(result.classifications[0].kind, ClassificationType::Novel);
    }

    #[test]
    fn classify_picks_most_frequent_significant_word() {
        let result = classify("", "orbit orbit orbit gravity");
        assert_eq!(result.primary_topic.as_deref(), Some("orbit"));
    }
}
