use std::collections::HashSet;

/// Lowercased whitespace-split token bag, per §4.2's `catalog_shift` / `entries_revised`
/// definition. Kept crude on purpose — §9 notes a production implementation may refine
/// tokenization, but test vectors pin this exact behavior.
pub fn word_bag(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// The `(topic + " " + content[..200]).lower().split()` bag used by the integration-cost
/// engine's `entries_revised` and `orphan` computations.
pub fn entry_token_bag(topic: &str, content: &str) -> HashSet<String> {
    let prefix: String = content.chars().take(200).collect();
    word_bag(&format!("{topic} {prefix}"))
}

pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f32 / union as f32
}

pub fn overlap_count(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

/// Character trigrams of a lowercased, whitespace-collapsed string, used by lexical search.
pub fn char_trigrams(text: &str) -> HashSet<String> {
    let normalized: String = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < 3 {
        return [normalized].into_iter().filter(|s| !s.is_empty()).collect();
    }
    chars
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Trigram similarity (Jaccard over character trigram sets) between a query and a document.
pub fn trigram_similarity(query: &str, document: &str) -> f32 {
    let q = char_trigrams(query);
    let d = char_trigrams(document);
    jaccard(&q, &d)
}
