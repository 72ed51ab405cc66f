//! Integration-Cost Engine (B, §4.2). A pure function of the candidate entry plus the
//! pre-write snapshot: no I/O, no claims, no comparisons. Ported from
//! `bootstrap_notebook.py::_compute_integration_cost`, pinned exactly (see SPEC_FULL §4.2).
use std::collections::HashSet;

use common::storage::types::entry::{Entry, EntryInput};
use common::storage::types::integration_cost::IntegrationCost;
use common::utils::tokenize::{entry_token_bag, overlap_count, word_bag};

pub fn compute_integration_cost(
    candidate: &EntryInput,
    revision_target: Option<&Entry>,
    snapshot: &[Entry],
) -> IntegrationCost {
    let new_words = entry_token_bag(&candidate.topic, &candidate.content);
    let new_references: HashSet<&str> = candidate.references.iter().map(String::as_str).collect();
    let existing_ids: HashSet<&str> = snapshot.iter().map(|e| e.id.as_str()).collect();

    // -- entries_revised --
    let mut entries_revised: u32 = 0;
    for existing in snapshot {
        let is_revision_target = revision_target.map(|t| t.id == existing.id).unwrap_or(false);
        if is_revision_target {
            entries_revised += 1;
            continue;
        }
        let existing_words = entry_token_bag(&existing.topic, &existing.content);
        let union = new_words.union(&existing_words).count().max(1);
        let overlap = new_words.intersection(&existing_words).count();
        if overlap as f32 / union as f32 > 0.3 {
            entries_revised += 1;
        }
    }

    // -- references_broken --
    let references_broken = new_references.difference(&existing_ids).count() as u32;

    // -- catalog_shift --
    let mut existing_topics: HashSet<String> = HashSet::new();
    for existing in snapshot {
        existing_topics.extend(word_bag(&existing.topic));
    }
    let new_topic_words = word_bag(&candidate.topic);
    let catalog_shift = if new_topic_words.is_empty() {
        0.0
    } else {
        let novel = new_topic_words.difference(&existing_topics).count();
        round4(novel as f32 / new_topic_words.len() as f32)
    };

    // -- orphan --
    let has_references = new_references.intersection(&existing_ids).count() > 0;
    let has_topic_overlap = snapshot.iter().any(|existing| {
        let existing_words = entry_token_bag(&existing.topic, &existing.content);
        overlap_count(&new_words, &existing_words) > 2
    });
    let orphan = !has_references && !has_topic_overlap && !snapshot.is_empty();

    IntegrationCost {
        entries_revised,
        references_broken,
        catalog_shift,
        orphan,
    }
}

fn round4(v: f32) -> f32 {
    (v * 10_000.0).round() / 10_000.0
}
